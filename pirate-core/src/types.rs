use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single ingredient line, e.g. "Chicken breast: 200g".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    pub amount: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: amount.into(),
        }
    }
}

/// Nutrition totals for the whole recipe (not per serving).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NutritionalInfo {
    pub calories: u32,
    /// Grams.
    pub protein: u32,
    /// Grams.
    pub carbs: u32,
    /// Grams.
    pub fat: u32,
}

/// A validated recipe produced by [`crate::parse::parse_recipe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRecipe {
    pub title: String,
    pub servings: u32,
    /// Free text, e.g. "25 minutes".
    pub cooking_time: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub nutritional_info: NutritionalInfo,
}

impl StructuredRecipe {
    /// Render the recipe back into the line template the assistant is asked to produce.
    ///
    /// Parsing the output of this function yields an equal recipe.
    pub fn to_template_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Title: {}\n", self.title));
        out.push_str(&format!("Servings: {}\n", self.servings));
        out.push_str(&format!("Cooking Time: {}\n\n", self.cooking_time));

        out.push_str("Ingredients:\n");
        for ingredient in &self.ingredients {
            out.push_str(&format!("- {}: {}\n", ingredient.name, ingredient.amount));
        }

        out.push_str("\nInstructions:\n");
        for (i, step) in self.instructions.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, step));
        }

        let n = &self.nutritional_info;
        out.push_str("\nNutritional Information (for entire recipe):\n");
        out.push_str(&format!("Calories: {}\n", n.calories));
        out.push_str(&format!("Protein: {} g\n", n.protein));
        out.push_str(&format!("Carbs: {} g\n", n.carbs));
        out.push_str(&format!("Fat: {} g\n", n.fat));
        out
    }
}
