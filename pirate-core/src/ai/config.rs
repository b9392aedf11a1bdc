//! Assistant configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

use super::poll::PollPolicy;

/// Default OpenAI API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default number of generation attempts per request.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
}

/// Assistant client configuration.
///
/// Credentials are optional here so a server can start without them; the
/// client reports [`ConfigError`] on the first request that needs them.
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// API key for the generation service.
    pub api_key: Option<String>,
    /// Identity of the preconfigured assistant.
    pub assistant_id: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Run polling policy.
    pub poll: PollPolicy,
    /// Attempts per request before giving up.
    pub max_attempts: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            assistant_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl AiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required at request time:
    /// - `OPENAI_API_KEY`
    /// - `OPENAI_ASSISTANT_ID`
    ///
    /// Optional:
    /// - `PIRATE_AI_BASE_URL` (default: "https://api.openai.com/v1")
    /// - `PIRATE_POLL_INITIAL_MS` (default: 1000)
    /// - `PIRATE_POLL_MAX_MS` (default: 5000)
    /// - `PIRATE_POLL_TIMEOUT_SECS` (default: 60)
    /// - `PIRATE_MAX_ATTEMPTS` (default: 3)
    pub fn from_env() -> Self {
        let defaults = PollPolicy::default();

        let poll = PollPolicy {
            initial_delay: env_parse("PIRATE_POLL_INITIAL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.initial_delay),
            max_delay: env_parse("PIRATE_POLL_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
            timeout: env_parse("PIRATE_POLL_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        };

        Self {
            api_key: non_empty_var("OPENAI_API_KEY"),
            assistant_id: non_empty_var("OPENAI_ASSISTANT_ID"),
            base_url: env::var("PIRATE_AI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            poll,
            max_attempts: env_parse("PIRATE_MAX_ATTEMPTS").unwrap_or(DEFAULT_MAX_ATTEMPTS),
        }
    }

    /// Return `(api_key, assistant_id)` or the first missing variable.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;
        let assistant_id = self
            .assistant_id
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_ASSISTANT_ID".to_string()))?;
        Ok((api_key, assistant_id))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_missing_key() {
        let config = AiConfig {
            assistant_id: Some("asst_123".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.credentials().unwrap_err(),
            ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string())
        );
    }

    #[test]
    fn test_credentials_missing_assistant() {
        let config = AiConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.credentials().unwrap_err(),
            ConfigError::MissingEnvVar("OPENAI_ASSISTANT_ID".to_string())
        );
    }

    #[test]
    fn test_credentials_present() {
        let config = AiConfig {
            api_key: Some("sk-test".to_string()),
            assistant_id: Some("asst_123".to_string()),
            ..Default::default()
        };
        assert_eq!(config.credentials().unwrap(), ("sk-test", "asst_123"));
    }
}
