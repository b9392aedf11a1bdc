//! AI prompt templates.

pub mod recipe;

pub use recipe::render_recipe_prompt;
