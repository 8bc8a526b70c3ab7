//! Focus block to calendar event mapping

use chrono::{DateTime, NaiveDate, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{debug, warn};

use super::{EventRequest, FOCUS_DESCRIPTION};
use crate::schedule::{ClockTime, FocusBlock};

/// Why a focus block could not become an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("Focus block '{description}': cannot parse time '{token}'")]
    InvalidTime { description: String, token: String },

    #[error("Focus block '{description}': end {end} is not after start {start}")]
    EmptyRange {
        description: String,
        start: String,
        end: String,
    },

    #[error("Focus block '{description}': {time} does not exist on {date} in {tz}")]
    NonexistentTime {
        description: String,
        time: String,
        date: NaiveDate,
        tz: Tz,
    },
}

/// Requests built from a list of focus blocks, plus the blocks that failed
#[derive(Debug, Clone, Default)]
pub struct MappedEvents {
    pub requests: Vec<EventRequest>,
    pub rejected: Vec<MappingError>,
}

/// Map every focus block onto `date` in `tz`, skipping malformed ones
pub fn map_to_events(blocks: &[FocusBlock], date: NaiveDate, tz: Tz) -> MappedEvents {
    debug!(block_count = blocks.len(), %date, %tz, "map_to_events: called");
    let mut mapped = MappedEvents::default();

    for block in blocks {
        match map_block(block, date, tz) {
            Ok(request) => mapped.requests.push(request),
            Err(e) => {
                warn!("Skipping focus block: {}", e);
                mapped.rejected.push(e);
            }
        }
    }

    mapped
}

/// Map one focus block; end must be strictly after start on the same day
pub fn map_block(block: &FocusBlock, date: NaiveDate, tz: Tz) -> Result<EventRequest, MappingError> {
    let start = resolve(block, &block.start, date, tz)?;
    let end = resolve(block, &block.end, date, tz)?;

    if end <= start {
        return Err(MappingError::EmptyRange {
            description: block.description.clone(),
            start: block.start.clone(),
            end: block.end.clone(),
        });
    }

    Ok(EventRequest {
        summary: block.description.clone(),
        start,
        end,
        description: FOCUS_DESCRIPTION.to_string(),
    })
}

fn resolve(block: &FocusBlock, token: &str, date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, MappingError> {
    let clock = ClockTime::parse(token).ok_or_else(|| MappingError::InvalidTime {
        description: block.description.clone(),
        token: token.to_string(),
    })?;

    // DST fold: take the first occurrence
    tz.from_local_datetime(&date.and_time(clock.to_naive_time()))
        .earliest()
        .ok_or_else(|| MappingError::NonexistentTime {
            description: block.description.clone(),
            time: token.to_string(),
            date,
            tz,
        })
}
