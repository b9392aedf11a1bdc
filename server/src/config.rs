//! Server configuration from environment variables.

use pirate_core::ai::AiConfig;
use pirate_core::{CacheConfig, PurchaseConfig};
use std::env;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Include the debug error chain as `stack` in 500 responses.
    pub expose_error_details: bool,
    pub ai: AiConfig,
    pub cache: CacheConfig,
    pub purchase: PurchaseConfig,
}

impl ServerConfig {
    /// Load configuration.
    ///
    /// Never fails: missing credentials surface as per-request errors.
    ///
    /// - `PIRATE_BIND_ADDR` (default: "0.0.0.0:3000")
    /// - `PIRATE_EXPOSE_ERROR_DETAILS` (default: false)
    /// - see [`AiConfig::from_env`], [`CacheConfig::from_env`], [`PurchaseConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("PIRATE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            expose_error_details: env::var("PIRATE_EXPOSE_ERROR_DETAILS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            ai: AiConfig::from_env(),
            cache: CacheConfig::from_env(),
            purchase: PurchaseConfig::from_env(),
        }
    }
}
