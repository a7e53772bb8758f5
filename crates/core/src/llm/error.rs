use crate::llm::transport::TransportError;
use reqwest::StatusCode;
use thiserror::Error;

/// The model's reply could not be turned into a usable analysis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Request(String),

    /// Non-success, non-rate-limit HTTP status. Never retried.
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("rate limited on all {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<TransportError> for LlmError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(msg) => Self::Timeout(msg),
            TransportError::Request(msg) => Self::Request(msg),
        }
    }
}
