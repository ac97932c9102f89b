// ABOUTME: Shared error taxonomy for pipeline, document and notification operations
// ABOUTME: Package-specific errors (storage, artifacts, notifier) convert into ServiceError

use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// External collaborator that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    RecordStore,
    ArtifactStore,
    Notifier,
    TextGenerator,
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Upstream::RecordStore => "record store",
            Upstream::ArtifactStore => "artifact store",
            Upstream::Notifier => "notifier",
            Upstream::TextGenerator => "text generator",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: Upstream, message: String },

    #[error("Rate limited by {0}")]
    RateLimited(Upstream),

    #[error("Quota exceeded for {0}")]
    QuotaExceeded(Upstream),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(service: Upstream, msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service,
            message: msg.into(),
        }
    }

    /// Machine-readable code used by the HTTP layer
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::PreconditionFailed(_) => "PRECONDITION_FAILED",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            ServiceError::RateLimited(_) => "RATE_LIMITED",
            ServiceError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            ServiceError::Conflict(_) => "CONFLICT",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}
