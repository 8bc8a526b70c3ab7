//! Input assembly: task board text plus the target day's calendar

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::RunError;
use crate::calendar::{CalendarEvent, CalendarService};

/// Everything the prompt is built from
#[derive(Debug, Clone)]
pub struct Inputs {
    pub kanban: String,
    pub events: Vec<CalendarEvent>,
}

pub struct InputAssembler {
    kanban_path: PathBuf,
    calendar: Option<Arc<dyn CalendarService>>,
}

impl InputAssembler {
    pub fn new(kanban_path: impl Into<PathBuf>, calendar: Option<Arc<dyn CalendarService>>) -> Self {
        Self {
            kanban_path: kanban_path.into(),
            calendar,
        }
    }

    /// Read the task board (required) and the day's events (best effort)
    pub async fn assemble(&self, date: NaiveDate) -> Result<Inputs, RunError> {
        debug!(kanban_path = ?self.kanban_path, %date, "assemble: called");
        let kanban = std::fs::read_to_string(&self.kanban_path).map_err(|source| RunError::Input {
            path: self.kanban_path.clone(),
            source,
        })?;
        info!("Read task board {} ({} bytes)", self.kanban_path.display(), kanban.len());

        let events = self.read_events(date).await;
        Ok(Inputs { kanban, events })
    }

    /// A failed read leaves the prompt without calendar events
    async fn read_events(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        let Some(calendar) = &self.calendar else {
            debug!("read_events: calendar disabled");
            return Vec::new();
        };

        match calendar.list_events(date).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Calendar read failed, planning without events: {}", e);
                Vec::new()
            }
        }
    }
}
