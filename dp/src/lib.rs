//! Dayplanner - kanban board in, tomorrow's plan out
//!
//! Each run reads a task board and the target day's calendar, asks a
//! completion service for a schedule, normalizes the answer into a fixed
//! journal layout, writes it to a dated markdown file and turns the plan's
//! focus blocks into calendar events.
//!
//! # Modules
//!
//! - [`schedule`] - response normalization and focus block extraction
//! - [`calendar`] - calendar service trait, Google client, focus block mapping
//! - [`llm`] - completion client trait and Anthropic implementation
//! - [`prompts`] - plan prompt templates
//! - [`journal`] - dated journal file writer
//! - [`planner`] - the run pipeline
//! - [`retry`] - retry policy and wrapper
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod calendar;
pub mod cli;
pub mod config;
pub mod journal;
pub mod llm;
pub mod planner;
pub mod prompts;
pub mod retry;
pub mod schedule;

// Re-export commonly used types
pub use calendar::{CalendarEvent, CalendarService, CreatedEvent, EventRequest, GoogleCalendar, map_to_events};
pub use config::{CalendarConfig, Config, LlmConfig, PlannerConfig};
pub use journal::JournalWriter;
pub use llm::{AnthropicClient, CompletionRequest, CompletionResponse, LlmClient, LlmError, RawResponse, create_client};
pub use planner::{Planner, RunError, RunOptions, RunOutcome, RunReport};
pub use retry::{FailureKind, RetryPolicy};
pub use schedule::{FocusBlock, Normalized, NormalizedDocument, ScheduleError, normalize, normalize_text};
