//! Calendar error types

use thiserror::Error;

/// Errors from calendar reads and writes
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Calendar token expired or revoked")]
    AuthExpired,

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Calendar configuration error: {0}")]
    Config(String),

    #[error("Unreadable event '{summary}': {reason}")]
    InvalidEvent { summary: String, reason: String },
}

impl CalendarError {
    /// Needs a new token before anything can succeed
    pub fn is_auth(&self) -> bool {
        matches!(self, CalendarError::AuthExpired | CalendarError::ApiError { status: 403, .. })
    }
}
