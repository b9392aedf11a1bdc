//! Cached recipe generation.

use crate::ai::RunStatus;
use crate::cache::{prompt_hash, RecipeCache};
use crate::generate::{GenerateError, RecipeGenerator};
use crate::types::StructuredRecipe;

/// A recipe and whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    pub recipe: StructuredRecipe,
    pub cached: bool,
}

/// The generation pipeline wrapped in the shared recipe cache.
#[derive(Clone)]
pub struct RecipeService {
    generator: RecipeGenerator,
    cache: RecipeCache,
}

impl RecipeService {
    pub fn new(generator: RecipeGenerator, cache: RecipeCache) -> Self {
        Self { generator, cache }
    }

    /// Look up `prompt` in the cache, generating on a miss.
    ///
    /// Concurrent misses for the same prompt share one generation; only the
    /// caller that started it receives run status updates.
    pub async fn recipe_for(
        &self,
        prompt: &str,
        on_status: &(dyn Fn(&RunStatus) + Send + Sync),
    ) -> Result<Generated, GenerateError> {
        let hash = prompt_hash(prompt);

        if let Some(recipe) = self.cache.get(prompt).await {
            tracing::debug!(prompt_hash = %hash, "Recipe cache hit");
            return Ok(Generated {
                recipe,
                cached: true,
            });
        }

        tracing::debug!(
            prompt_hash = %hash,
            prompt_len = prompt.len(),
            "Recipe cache miss, generating"
        );

        let recipe = self
            .cache
            .get_or_generate(prompt, self.generator.generate(prompt, on_status))
            .await
            .map_err(|e| (*e).clone())?;

        Ok(Generated {
            recipe,
            cached: false,
        })
    }
}
