//! Per-run identity carried through every component

use chrono::{Days, NaiveDate, Utc};
use chrono_tz::Tz;
use tracing::{Span, info_span};
use uuid::Uuid;

/// One planner run: a fresh id and the date being planned
///
/// Everything logged inside `span()` carries both fields.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: Uuid,
    target_date: NaiveDate,
    span: Span,
}

impl RunContext {
    pub fn new(target_date: NaiveDate) -> Self {
        let run_id = Uuid::now_v7();
        let span = info_span!("run", %run_id, %target_date);
        Self {
            run_id,
            target_date,
            span,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn target_date(&self) -> NaiveDate {
        self.target_date
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Tomorrow in `tz`, relative to now
pub fn tomorrow_in(tz: Tz) -> NaiveDate {
    next_day(Utc::now().with_timezone(&tz).date_naive())
}

pub(crate) fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}
