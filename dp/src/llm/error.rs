//! LLM error types

use std::time::Duration;
use thiserror::Error;

use crate::retry::{Classify, FailureKind};

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Classify for LlmError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            LlmError::RateLimited { .. } => FailureKind::RateLimited,
            LlmError::ApiError { status, .. } if *status >= 500 => FailureKind::Server,
            LlmError::ApiError { .. } => FailureKind::Client,
            LlmError::Network(e) if e.is_decode() => FailureKind::Decode,
            LlmError::Network(_) => FailureKind::Transport,
            LlmError::Timeout(_) => FailureKind::Transport,
            LlmError::InvalidResponse(_) => FailureKind::Decode,
            LlmError::Json(_) => FailureKind::Decode,
            LlmError::Config(_) => FailureKind::Client,
        }
    }
}
