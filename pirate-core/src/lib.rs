pub mod ai;
pub mod cache;
pub mod generate;
pub mod mail;
pub mod parse;
pub mod purchase;
pub mod service;
pub mod types;

pub use cache::{CacheConfig, RecipeCache};
pub use generate::{GenerateError, RecipeGenerator};
pub use mail::{Email, MailError, Mailer, RecordingMailer, SendGridMailer};
pub use parse::{parse_recipe, ParseError};
pub use purchase::{send_purchase_email, DownloadLink, PurchaseConfig, PurchasedBook};
pub use service::{Generated, RecipeService};
pub use types::{Ingredient, NutritionalInfo, StructuredRecipe};
