//! Recipe text parsing.
//!
//! Turns the assistant's line-oriented reply (see [`crate::ai::prompts::recipe`])
//! into a [`StructuredRecipe`]. The grammar is deliberately small: a handful of
//! `Label:` prefixes plus two list sections.

use thiserror::Error;

use crate::types::{Ingredient, NutritionalInfo, StructuredRecipe};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Recipe is missing required fields: {}", missing.join(", "))]
    Incomplete { missing: Vec<&'static str> },

    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Ingredients,
    Instructions,
}

/// Parse assistant output into a recipe.
///
/// Fails unless title, servings, cooking time, at least one ingredient and at
/// least one instruction were all found. Nutrition lines are optional and
/// default to zero, but a nutrition or servings value without a leading
/// integer is an error.
pub fn parse_recipe(text: &str) -> Result<StructuredRecipe, ParseError> {
    let mut title = String::new();
    let mut servings: u32 = 0;
    let mut cooking_time = String::new();
    let mut ingredients = Vec::new();
    let mut instructions = Vec::new();
    let mut nutrition = NutritionalInfo::default();

    let mut section = Section::None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("Title:") {
            title = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("Servings:") {
            servings = parse_leading_int("servings", rest)?;
        } else if let Some(rest) = line.strip_prefix("Cooking Time:") {
            cooking_time = rest.trim().to_string();
        } else if line == "Ingredients:" {
            section = Section::Ingredients;
        } else if line == "Instructions:" {
            section = Section::Instructions;
        } else if line.starts_with("Nutritional Information") {
            section = Section::None;
        } else if let Some(rest) = line.strip_prefix("Calories:") {
            nutrition.calories = parse_leading_int("calories", rest)?;
        } else if let Some(rest) = line.strip_prefix("Protein:") {
            nutrition.protein = parse_leading_int("protein", rest)?;
        } else if let Some(rest) = line.strip_prefix("Carbs:") {
            nutrition.carbs = parse_leading_int("carbs", rest)?;
        } else if let Some(rest) = line.strip_prefix("Fat:") {
            nutrition.fat = parse_leading_int("fat", rest)?;
        } else if section == Section::Ingredients {
            if let Some((name, amount)) = line.split_once(':') {
                ingredients.push(Ingredient::new(strip_bullet(name), amount.trim()));
            }
        } else if section == Section::Instructions {
            instructions.push(strip_step_number(line).to_string());
        }
    }

    let mut missing = Vec::new();
    if title.is_empty() {
        missing.push("title");
    }
    if servings == 0 {
        missing.push("servings");
    }
    if cooking_time.is_empty() {
        missing.push("cookingTime");
    }
    if ingredients.is_empty() {
        missing.push("ingredients");
    }
    if instructions.is_empty() {
        missing.push("instructions");
    }
    if !missing.is_empty() {
        return Err(ParseError::Incomplete { missing });
    }

    Ok(StructuredRecipe {
        title,
        servings,
        cooking_time,
        ingredients,
        instructions,
        nutritional_info: nutrition,
    })
}

/// Parse the integer at the start of a value ("70 g" -> 70, "12.5g" -> 12).
fn parse_leading_int(field: &'static str, value: &str) -> Result<u32, ParseError> {
    let value = value.trim();
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());

    value[..digits_end]
        .parse()
        .map_err(|_| ParseError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

fn strip_bullet(name: &str) -> &str {
    name.trim()
        .trim_start_matches(['-', '*', '•'])
        .trim_start()
}

/// "3. Stir well" -> "Stir well". Lines without a numeric prefix are returned unchanged.
fn strip_step_number(line: &str) -> &str {
    let digits_end = line
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len());
    if digits_end == 0 {
        return line;
    }
    match line[digits_end..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTEIN_BOWL: &str = "Title: Pirate's Protein Bowl
Servings: 2
Cooking Time: 15 minutes

Ingredients:
- Chicken breast: 200g
- Broccoli: 150g

Instructions:
1. Grill the chicken.
2. Steam the broccoli.

Nutritional Information (for entire recipe):
Calories: 600
Protein: 70 g
Carbs: 20 g
Fat: 15 g
";

    fn protein_bowl() -> StructuredRecipe {
        StructuredRecipe {
            title: "Pirate's Protein Bowl".to_string(),
            servings: 2,
            cooking_time: "15 minutes".to_string(),
            ingredients: vec![
                Ingredient::new("Chicken breast", "200g"),
                Ingredient::new("Broccoli", "150g"),
            ],
            instructions: vec![
                "Grill the chicken.".to_string(),
                "Steam the broccoli.".to_string(),
            ],
            nutritional_info: NutritionalInfo {
                calories: 600,
                protein: 70,
                carbs: 20,
                fat: 15,
            },
        }
    }

    #[test]
    fn test_parse_protein_bowl() {
        assert_eq!(parse_recipe(PROTEIN_BOWL).unwrap(), protein_bowl());
    }

    #[test]
    fn test_reparse_template_text() {
        let recipe = parse_recipe(PROTEIN_BOWL).unwrap();
        let reparsed = parse_recipe(&recipe.to_template_text()).unwrap();
        assert_eq!(reparsed, recipe);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        let text = "   Title:   Spaced Out   \n\tServings:  3 \nCooking Time:  1 hour  \n\
                    Ingredients:\n   Oats :  1 cup  \nInstructions:\n   1.   Mix.  \n";
        let recipe = parse_recipe(text).unwrap();
        assert_eq!(recipe.title, "Spaced Out");
        assert_eq!(recipe.servings, 3);
        assert_eq!(recipe.cooking_time, "1 hour");
        assert_eq!(recipe.ingredients, vec![Ingredient::new("Oats", "1 cup")]);
        assert_eq!(recipe.instructions, vec!["Mix.".to_string()]);
    }

    #[test]
    fn test_missing_nutrition_defaults_to_zero() {
        let text = "Title: T\nServings: 1\nCooking Time: 5 min\nIngredients:\nEgg: 1\nInstructions:\nBoil.";
        let recipe = parse_recipe(text).unwrap();
        assert_eq!(recipe.nutritional_info, NutritionalInfo::default());
        assert_eq!(recipe.instructions, vec!["Boil.".to_string()]);
    }

    #[test]
    fn test_each_missing_required_field_fails() {
        let cases = [
            ("Title: Pirate's Protein Bowl\n", "title"),
            ("Servings: 2\n", "servings"),
            ("Cooking Time: 15 minutes\n", "cookingTime"),
        ];
        for (line, field) in cases {
            let text = PROTEIN_BOWL.replace(line, "");
            let err = parse_recipe(&text).unwrap_err();
            assert_eq!(
                err,
                ParseError::Incomplete {
                    missing: vec![field]
                },
                "removing {line:?}"
            );
        }
    }

    #[test]
    fn test_no_ingredients_fails() {
        let text = PROTEIN_BOWL
            .replace("- Chicken breast: 200g\n", "")
            .replace("- Broccoli: 150g\n", "");
        let err = parse_recipe(&text).unwrap_err();
        assert_eq!(
            err,
            ParseError::Incomplete {
                missing: vec!["ingredients"]
            }
        );
    }

    #[test]
    fn test_no_instructions_fails() {
        let text = PROTEIN_BOWL
            .replace("1. Grill the chicken.\n", "")
            .replace("2. Steam the broccoli.\n", "");
        let err = parse_recipe(&text).unwrap_err();
        assert_eq!(
            err,
            ParseError::Incomplete {
                missing: vec!["instructions"]
            }
        );
    }

    #[test]
    fn test_zero_servings_is_incomplete() {
        let text = PROTEIN_BOWL.replace("Servings: 2", "Servings: 0");
        assert!(matches!(
            parse_recipe(&text),
            Err(ParseError::Incomplete { .. })
        ));
    }

    #[test]
    fn test_empty_text_reports_all_fields() {
        let err = parse_recipe("").unwrap_err();
        assert_eq!(
            err,
            ParseError::Incomplete {
                missing: vec![
                    "title",
                    "servings",
                    "cookingTime",
                    "ingredients",
                    "instructions"
                ]
            }
        );
    }

    #[test]
    fn test_non_numeric_value_is_error() {
        let text = PROTEIN_BOWL.replace("Calories: 600", "Calories: about 600");
        assert_eq!(
            parse_recipe(&text).unwrap_err(),
            ParseError::InvalidNumber {
                field: "calories",
                value: "about 600".to_string()
            }
        );

        let text = PROTEIN_BOWL.replace("Servings: 2", "Servings: two");
        assert!(matches!(
            parse_recipe(&text),
            Err(ParseError::InvalidNumber {
                field: "servings",
                ..
            })
        ));
    }

    #[test]
    fn test_fractional_values_truncate() {
        let text = PROTEIN_BOWL.replace("Fat: 15 g", "Fat: 15.9 g");
        assert_eq!(parse_recipe(&text).unwrap().nutritional_info.fat, 15);
    }

    #[test]
    fn test_ingredient_lines_without_colon_ignored() {
        let text = PROTEIN_BOWL.replace("- Broccoli: 150g", "- A pinch of love");
        let recipe = parse_recipe(&text).unwrap();
        assert_eq!(
            recipe.ingredients,
            vec![Ingredient::new("Chicken breast", "200g")]
        );
    }

    #[test]
    fn test_ingredient_amount_keeps_later_colons() {
        let text = PROTEIN_BOWL.replace("- Broccoli: 150g", "- Broccoli: 150g: fresh");
        let recipe = parse_recipe(&text).unwrap();
        assert_eq!(recipe.ingredients[1], Ingredient::new("Broccoli", "150g: fresh"));
    }

    #[test]
    fn test_nutrition_header_closes_section() {
        let text = PROTEIN_BOWL.replace(
            "Calories: 600",
            "Calories: 600\nPer serving: half of everything",
        );
        let recipe = parse_recipe(&text).unwrap();
        assert_eq!(recipe.instructions.len(), 2);
        assert_eq!(recipe.ingredients.len(), 2);
    }

    #[test]
    fn test_text_outside_sections_ignored() {
        let text = format!("Ahoy! Here be yer recipe.\n{PROTEIN_BOWL}\nEnjoy, matey!");
        // The trailing line lands after the nutrition header, outside any section.
        assert_eq!(parse_recipe(&text).unwrap(), protein_bowl());
    }

    #[test]
    fn test_strip_step_number() {
        assert_eq!(strip_step_number("12. Serve"), "Serve");
        assert_eq!(strip_step_number("3.Serve"), "Serve");
        assert_eq!(strip_step_number("Serve hot"), "Serve hot");
        assert_eq!(strip_step_number("350 degrees oven"), "350 degrees oven");
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("fat", " 70 g").unwrap(), 70);
        assert_eq!(parse_leading_int("fat", "12.5g").unwrap(), 12);
        assert!(parse_leading_int("fat", "").is_err());
        assert!(parse_leading_int("fat", "-4").is_err());
    }
}
