//! In-memory recipe cache keyed by raw prompt text.

use moka::future::Cache;
use moka::policy::EvictionPolicy;
use sha2::{Digest, Sha256};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::types::StructuredRecipe;

/// Default time-to-live for cached recipes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Default maximum number of cached prompts.
pub const DEFAULT_MAX_ENTRIES: u64 = 1_000;

/// Recipe cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Lifetime of an entry, measured from insertion.
    pub ttl: Duration,
    /// Least-recently-used entries are evicted beyond this count.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Load settings from `PIRATE_CACHE_TTL_SECS` and `PIRATE_CACHE_MAX_ENTRIES`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: std::env::var("PIRATE_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ttl),
            max_entries: std::env::var("PIRATE_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
        }
    }
}

/// Shared prompt -> recipe cache.
///
/// Identical prompts share one entry regardless of who asked. Entries expire a
/// fixed TTL after insertion and are dropped lazily. Cloning is cheap and
/// clones share storage.
#[derive(Clone)]
pub struct RecipeCache {
    entries: Cache<String, StructuredRecipe>,
}

impl RecipeCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { entries }
    }

    pub async fn get(&self, prompt: &str) -> Option<StructuredRecipe> {
        self.entries.get(prompt).await
    }

    /// Insert or overwrite the recipe for `prompt`.
    pub async fn set(&self, prompt: &str, recipe: StructuredRecipe) {
        self.entries.insert(prompt.to_string(), recipe).await;
    }

    /// Return the cached recipe, or run `generate` and cache a successful result.
    ///
    /// Concurrent callers for the same missing prompt wait on a single
    /// `generate` future and all observe its result. Failures are not cached.
    pub async fn get_or_generate<F, E>(
        &self,
        prompt: &str,
        generate: F,
    ) -> Result<StructuredRecipe, Arc<E>>
    where
        F: Future<Output = Result<StructuredRecipe, E>>,
        E: Send + Sync + 'static,
    {
        self.entries.try_get_with(prompt.to_string(), generate).await
    }
}

impl Default for RecipeCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Short stable hash of a prompt for log fields.
pub fn prompt_hash(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
