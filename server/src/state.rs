use pirate_core::ai::OpenAiAssistantClient;
use pirate_core::{
    Mailer, PurchaseConfig, RecipeCache, RecipeGenerator, RecipeService, SendGridMailer,
};
use std::sync::Arc;

use crate::config::ServerConfig;

/// Application state shared across all handlers
pub type AppState = Arc<SharedState>;

pub struct SharedState {
    pub recipes: RecipeService,
    pub mailer: Arc<dyn Mailer>,
    pub purchase: PurchaseConfig,
    pub expose_error_details: bool,
}

impl SharedState {
    /// Wire the production clients from configuration.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let client = Arc::new(OpenAiAssistantClient::new(config.ai.clone())?);
        let generator = RecipeGenerator::new(client, config.ai.poll.clone(), config.ai.max_attempts);

        Ok(Self {
            recipes: RecipeService::new(generator, RecipeCache::new(config.cache)),
            mailer: Arc::new(SendGridMailer::from_env()?),
            purchase: config.purchase.clone(),
            expose_error_details: config.expose_error_details,
        })
    }
}
