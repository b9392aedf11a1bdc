//! Recipe generation prompt.
//!
//! The output format described here is the grammar understood by
//! [`crate::parse::parse_recipe`]; keep them in sync.

/// Wrap the user's request in the recipe instruction template.
///
/// The request is embedded verbatim, even when empty.
pub fn render_recipe_prompt(request: &str) -> String {
    format!(
        r#"Based on the following user request: "{request}"

Please generate a high-protein, low-calorie recipe that best matches the user's intent. If the user's request is vague or not directly related to a specific recipe, use your knowledge to infer an appropriate recipe that aligns with their interests or dietary needs.

Provide the recipe in the following format:

Title: [Recipe Title]
Servings: [Number of Servings]
Cooking Time: [Cooking Time]

Ingredients:
- [Ingredient 1]: [Amount]
- [Ingredient 2]: [Amount]
...

Instructions:
1. [Step 1]
2. [Step 2]
...

Nutritional Information (for entire recipe):
Calories: [Total Calories]
Protein: [Total Protein] g
Carbs: [Total Carbs] g
Fat: [Total Fat] g

Important notes:
1. Ensure all nutritional information is accurate and consistent with the ingredients and serving size.
2. The nutritional information should be for the entire recipe, not per serving.
3. Aim for recipes with approximately 30-40g of protein per serving and under 500 calories per serving.
4. Include precise measurements for all ingredients to ensure accurate nutritional calculations.
5. IMPORTANT: Strictly adhere to the format provided above. Do not add any additional text or explanations outside of this format."#
    )
}
