// ABOUTME: Notifier abstraction for sending one email to one address
// ABOUTME: Errors keep rate limiting and quota exhaustion distinct from outages

use async_trait::async_trait;
use thiserror::Error;

use robodesk_core::{ServiceError, Upstream};

/// Binary attachment sent with an email
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Email provider rate limit reached")]
    RateLimited,

    #[error("Email provider quota exhausted")]
    QuotaExceeded,

    #[error("Email rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Email provider unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Email transport error: {0}")]
    Transport(String),
}

impl From<NotifierError> for ServiceError {
    fn from(err: NotifierError) -> Self {
        match err {
            NotifierError::RateLimited => ServiceError::RateLimited(Upstream::Notifier),
            NotifierError::QuotaExceeded => ServiceError::QuotaExceeded(Upstream::Notifier),
            other => ServiceError::upstream(Upstream::Notifier, other.to_string()),
        }
    }
}

/// Sends a single email
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifierError>;
}
