//! Transactional email via SendGrid.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

/// Default SendGrid API base URL.
pub const DEFAULT_SENDGRID_BASE_URL: &str = "https://api.sendgrid.com/v3";

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug, Clone)]
pub enum MailError {
    #[error("Mail service not configured: {0}")]
    NotConfigured(String),

    #[error("Mail request failed: {0}")]
    RequestFailed(String),

    #[error("Mail service returned error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// An outgoing email with plain-text and HTML bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// [`Mailer`] backed by the SendGrid v3 API.
pub struct SendGridMailer {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(api_key: Option<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| MailError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_SENDGRID_BASE_URL.to_string(),
            client,
        })
    }

    /// Reads `SENDGRID_API_KEY`. A missing key is reported when sending, not here.
    pub fn from_env() -> Result<Self, MailError> {
        Self::new(
            std::env::var("SENDGRID_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        )
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    subject: &'a str,
    content: Vec<SendGridContent<'a>>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'a str,
    value: &'a str,
}

impl<'a> From<&'a Email> for SendGridRequest<'a> {
    fn from(email: &'a Email) -> Self {
        Self {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress { email: &email.to }],
            }],
            from: SendGridAddress { email: &email.from },
            subject: &email.subject,
            content: vec![
                SendGridContent {
                    content_type: "text/plain",
                    value: &email.text,
                },
                SendGridContent {
                    content_type: "text/html",
                    value: &email.html,
                },
            ],
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MailError::NotConfigured("SENDGRID_API_KEY not set".to_string()))?;

        let response = self
            .client
            .post(format!("{}/mail/send", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&SendGridRequest::from(email))
            .send()
            .await
            .map_err(|e| MailError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(status = status.as_u16(), "Email accepted by SendGrid");
        Ok(())
    }
}

/// Records emails instead of sending them.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<Email>>,
    fail_with: Option<MailError>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer whose every send fails with `error`.
    pub fn failing(error: MailError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
