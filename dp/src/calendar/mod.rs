//! Calendar integration
//!
//! Reads the target day's events for the prompt and creates one event per
//! focus block. The service is a trait so the planner can run against a mock.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;

mod error;
mod google;
mod mapper;

pub use error::CalendarError;
pub use google::GoogleCalendar;
pub use mapper::{MappedEvents, MappingError, map_block, map_to_events};

/// Description attached to every created focus-block event
pub const FOCUS_DESCRIPTION: &str = "Deep work session scheduled by dayplanner";

/// Emoji placed on both sides of a created event's summary
pub const SUMMARY_BOOKEND: &str = "🎯";

/// An existing event on the target day
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub start_display: String,
    pub end_display: String,
    pub all_day: bool,
}

impl CalendarEvent {
    pub fn new(summary: impl Into<String>, start: DateTime<Tz>, end: DateTime<Tz>, all_day: bool) -> Self {
        let (start_display, end_display) = if all_day {
            ("all day".to_string(), "all day".to_string())
        } else {
            (format_clock(&start), format_clock(&end))
        };
        Self {
            summary: summary.into(),
            start,
            end,
            start_display,
            end_display,
            all_day,
        }
    }

    /// Line used in the prompt: `- 9:00am-10:00am: Standup`
    pub fn prompt_line(&self) -> String {
        if self.all_day {
            format!("- all day: {}", self.summary)
        } else {
            format!("- {}-{}: {}", self.start_display, self.end_display, self.summary)
        }
    }
}

/// A focus-block event to create
#[derive(Debug, Clone, PartialEq)]
pub struct EventRequest {
    /// Undecorated summary; bookends are added on the wire
    pub summary: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub description: String,
}

/// What the calendar returns for a created event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: String,
}

/// Read and write access to one calendar
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Events overlapping `date` (local midnight to local midnight), in start order
    async fn list_events(&self, date: NaiveDate) -> Result<Vec<CalendarEvent>, CalendarError>;

    /// Create one event
    async fn create_event(&self, request: &EventRequest) -> Result<CreatedEvent, CalendarError>;
}

/// `2:00pm` style: no leading zero, lower case
pub fn format_clock(dt: &DateTime<Tz>) -> String {
    let formatted = dt.format("%I:%M%p").to_string().to_lowercase();
    match formatted.strip_prefix('0') {
        Some(rest) => rest.to_string(),
        None => formatted,
    }
}

/// Summary with the emoji bookends
pub fn decorate_summary(summary: &str) -> String {
    format!("{} {} {}", SUMMARY_BOOKEND, summary, SUMMARY_BOOKEND)
}

/// Calendar section of the prompt
pub fn format_events_for_prompt(events: &[CalendarEvent]) -> String {
    if events.is_empty() {
        return "No calendar events scheduled.".to_string();
    }
    events.iter().map(CalendarEvent::prompt_line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
pub mod mock {
    //! In-memory calendar for tests

    use super::*;
    use std::sync::Mutex;

    pub struct MockCalendar {
        events: Vec<CalendarEvent>,
        fail_list: bool,
        fail_summaries: Vec<String>,
        reject_token: bool,
        attempts: Mutex<usize>,
        created: Mutex<Vec<EventRequest>>,
    }

    impl MockCalendar {
        pub fn new(events: Vec<CalendarEvent>) -> Self {
            Self {
                events,
                fail_list: false,
                fail_summaries: Vec::new(),
                reject_token: false,
                attempts: Mutex::new(0),
                created: Mutex::new(Vec::new()),
            }
        }

        /// Every `list_events` call fails
        pub fn failing_list(mut self) -> Self {
            self.fail_list = true;
            self
        }

        /// `create_event` fails for requests with this summary
        pub fn failing_on(mut self, summary: &str) -> Self {
            self.fail_summaries.push(summary.to_string());
            self
        }

        /// Every `create_event` call fails with an expired token
        pub fn rejecting_token(mut self) -> Self {
            self.reject_token = true;
            self
        }

        /// Number of `create_event` calls, successful or not
        pub fn attempts(&self) -> usize {
            *self.attempts.lock().unwrap()
        }

        pub fn created(&self) -> Vec<EventRequest> {
            self.created.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CalendarService for MockCalendar {
        async fn list_events(&self, _date: NaiveDate) -> Result<Vec<CalendarEvent>, CalendarError> {
            if self.fail_list {
                return Err(CalendarError::AuthExpired);
            }
            Ok(self.events.clone())
        }

        async fn create_event(&self, request: &EventRequest) -> Result<CreatedEvent, CalendarError> {
            *self.attempts.lock().unwrap() += 1;
            if self.reject_token {
                return Err(CalendarError::AuthExpired);
            }
            if self.fail_summaries.contains(&request.summary) {
                return Err(CalendarError::ApiError {
                    status: 500,
                    message: "backend error".to_string(),
                });
            }
            let mut created = self.created.lock().unwrap();
            created.push(request.clone());
            let id = format!("evt{}", created.len());
            Ok(CreatedEvent {
                html_link: format!("https://calendar.example.com/event?eid={}", id),
                id,
            })
        }
    }
}
