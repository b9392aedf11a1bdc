//! Hosted assistant integration.
//!
//! This module provides:
//! - `AssistantClient` trait for the thread/message/run cycle of the OpenAI Assistants API
//! - `OpenAiAssistantClient`, the REST implementation
//! - `await_completion`, run polling with capped exponential backoff
//! - `FakeAssistant` for tests
//! - Configuration via environment variables
//!
//! # Configuration
//!
//! - `OPENAI_API_KEY` (required per request): API key
//! - `OPENAI_ASSISTANT_ID` (required per request): assistant to run
//! - `PIRATE_AI_BASE_URL` (optional): API base URL
//! - `PIRATE_POLL_INITIAL_MS`, `PIRATE_POLL_MAX_MS`, `PIRATE_POLL_TIMEOUT_SECS` (optional)
//! - `PIRATE_MAX_ATTEMPTS` (optional): attempts per request
//!
//! # Example
//!
//! ```ignore
//! use pirate_core::ai::{AiConfig, OpenAiAssistantClient};
//! use pirate_core::RecipeGenerator;
//!
//! let config = AiConfig::from_env();
//! let generator = RecipeGenerator::new(
//!     std::sync::Arc::new(OpenAiAssistantClient::new(config.clone())?),
//!     config.poll,
//!     config.max_attempts,
//! );
//! let recipe = generator.generate("high protein breakfast", &|_| {}).await?;
//! ```

mod client;
mod config;
mod fake;
mod poll;
pub mod prompts;
mod types;

pub use client::{AiError, AssistantClient, OpenAiAssistantClient, REQUEST_TIMEOUT};
pub use config::{AiConfig, ConfigError, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS};
pub use fake::FakeAssistant;
pub use poll::{await_completion, PollPolicy};
pub use types::{Role, RunHandle, RunStatus};
