//! Run-level errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::journal::JournalError;
use crate::llm::LlmError;
use crate::schedule::ScheduleError;

/// Errors that abort a planner run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Failed to read task board {}: {source}", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to build prompt: {0}")]
    Prompt(String),

    #[error("Completion request failed: {0}")]
    Completion(#[from] LlmError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

impl RunError {
    /// The completion service answered but with something unusable
    pub fn is_malformed_response(&self) -> bool {
        matches!(self, RunError::Schedule(e) if e.is_malformed())
    }
}
