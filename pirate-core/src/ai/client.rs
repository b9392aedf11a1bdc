//! Assistant client for the OpenAI Assistants (threads/runs) API.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

use super::config::{AiConfig, ConfigError};
use super::types::{
    ApiErrorResponse, CreateMessageRequest, CreateRunRequest, MessageContent, MessageList, Role,
    RunHandle, RunObject, RunStatus, ThreadObject,
};

#[derive(Error, Debug, Clone)]
pub enum AiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Run did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Run ended with status {status}")]
    RunFailed { status: String },

    #[error("No text reply from assistant")]
    NoReply,
}

/// One request/response cycle with a hosted assistant.
///
/// Split into single steps so callers own the polling loop
/// (see [`super::poll::await_completion`]).
#[async_trait]
pub trait AssistantClient: Send + Sync {
    /// Create a thread, post `prompt` as the user message and start a run.
    ///
    /// Must fail with [`AiError::Config`] before any network call when
    /// credentials are missing.
    async fn submit(&self, prompt: &str) -> Result<RunHandle, AiError>;

    /// Fetch the current status of a run.
    async fn run_status(&self, run: &RunHandle) -> Result<RunStatus, AiError>;

    /// Text of the most recent assistant message in the thread.
    async fn fetch_latest_reply(&self, thread_id: &str) -> Result<String, AiError>;
}

/// Upper bound for a single HTTP request to the assistant API.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`AssistantClient`] backed by the OpenAI REST API.
pub struct OpenAiAssistantClient {
    client: Client,
    config: AiConfig,
}

impl OpenAiAssistantClient {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: RequestBuilder) -> Result<RequestBuilder, AiError> {
        let (api_key, _) = self.config.credentials()?;
        Ok(builder
            .bearer_auth(api_key)
            .header("OpenAI-Beta", "assistants=v2"))
    }

    /// Send a request and decode a JSON body, mapping non-2xx statuses to errors.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AiError> {
        let response = self
            .authed(builder)?
            .send()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(AiError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AiError::Api { status, message });
        }

        serde_json::from_str(&body).map_err(|e| AiError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl AssistantClient for OpenAiAssistantClient {
    async fn submit(&self, prompt: &str) -> Result<RunHandle, AiError> {
        let (_, assistant_id) = self.config.credentials()?;

        let thread: ThreadObject = self
            .send_json(
                self.client
                    .post(self.url("/threads"))
                    .json(&serde_json::json!({})),
            )
            .await?;

        let _: serde_json::Value = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/messages", thread.id)))
                    .json(&CreateMessageRequest {
                        role: Role::User,
                        content: prompt,
                    }),
            )
            .await?;

        let run: RunObject = self
            .send_json(
                self.client
                    .post(self.url(&format!("/threads/{}/runs", thread.id)))
                    .json(&CreateRunRequest { assistant_id }),
            )
            .await?;

        tracing::debug!(
            thread_id = %thread.id,
            run_id = %run.id,
            status = %run.status,
            "Started assistant run"
        );

        Ok(RunHandle {
            thread_id: thread.id,
            run_id: run.id,
        })
    }

    async fn run_status(&self, run: &RunHandle) -> Result<RunStatus, AiError> {
        let object: RunObject = self
            .send_json(self.client.get(self.url(&format!(
                "/threads/{}/runs/{}",
                run.thread_id, run.run_id
            ))))
            .await?;

        if let Some(error) = &object.last_error {
            tracing::warn!(
                run_id = %run.run_id,
                status = %object.status,
                error = %error.message,
                "Assistant run reported an error"
            );
        }

        Ok(object.status)
    }

    async fn fetch_latest_reply(&self, thread_id: &str) -> Result<String, AiError> {
        let list: MessageList = self
            .send_json(
                self.client
                    .get(self.url(&format!("/threads/{}/messages", thread_id)))
                    .query(&[("order", "desc"), ("limit", "20")]),
            )
            .await?;

        latest_assistant_text(list)
    }
}

/// Pick the newest assistant message from a newest-first listing and return its
/// first content block, which must be text.
pub(crate) fn latest_assistant_text(list: MessageList) -> Result<String, AiError> {
    let message = list
        .data
        .into_iter()
        .find(|m| m.role == Role::Assistant)
        .ok_or(AiError::NoReply)?;

    match message.content.into_iter().next() {
        Some(MessageContent::Text { text }) => Ok(text.value),
        _ => Err(AiError::NoReply),
    }
}
