//! Schedule normalization errors

use thiserror::Error;

/// Errors that make a completion response unusable as a day plan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Malformed response: no '{heading}' heading found")]
    MissingHeading { heading: &'static str },

    #[error("Invalid escape sequence at byte {position}: {reason}")]
    Unescape { position: usize, reason: String },
}

impl ScheduleError {
    /// True when the response never contained the plan heading
    pub fn is_malformed(&self) -> bool {
        matches!(self, ScheduleError::MissingHeading { .. })
    }
}
