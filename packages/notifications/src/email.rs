// ABOUTME: HTTP email API client implementing the Notifier trait
// ABOUTME: Posts JSON with base64 attachments and maps provider status codes to NotifierError

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::notifier::{Notifier, NotifierError, OutgoingEmail};

pub const DEFAULT_EMAIL_API_URL: &str = "https://api.resend.com/emails";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<AttachmentPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct AttachmentPayload<'a> {
    filename: &'a str,
    content: String,
    content_type: &'a str,
}

/// Notifier backed by a transactional email HTTP API
pub struct HttpEmailNotifier {
    client: Client,
    api_url: String,
    api_key: String,
}

impl HttpEmailNotifier {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NotifierError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl Notifier for HttpEmailNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifierError> {
        let request = SendEmailRequest {
            from: &email.from,
            to: vec![email.to.as_str()],
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| AttachmentPayload {
                    filename: &a.filename,
                    content: BASE64.encode(&a.content),
                    content_type: &a.content_type,
                })
                .collect(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Email API request to {} timed out", self.api_url);
                    NotifierError::Transport("Request timed out".to_string())
                } else {
                    error!("Email API request failed: {}", e);
                    NotifierError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            info!(
                "Email '{}' accepted for {} ({} attachments)",
                email.subject,
                email.to,
                email.attachments.len()
            );
            return Ok(());
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error!("Email API error: {} - {}", status, error_text);

        Err(classify_failure(status, error_text))
    }
}

fn classify_failure(status: StatusCode, body: String) -> NotifierError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        if body.to_lowercase().contains("quota") {
            return NotifierError::QuotaExceeded;
        }
        return NotifierError::RateLimited;
    }
    if status.is_server_error() {
        return NotifierError::Unavailable {
            status: status.as_u16(),
            message: body,
        };
    }
    NotifierError::Rejected {
        status: status.as_u16(),
        message: body,
    }
}
