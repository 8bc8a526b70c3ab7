//! Schedule normalization
//!
//! Turns a free-form completion response into a canonical day plan and pulls
//! out the focus blocks that become calendar events.
//!
//! Pipeline, each step idempotent on already-normalized text:
//! 1. unwrap the response container
//! 2. strip `Label(text="...")` debug wrappers
//! 3. decode backslash escapes
//! 4. drop everything before `# Day Planner`
//! 5. drop `# Schedule for ...` lines
//! 6. empty the reflective sections
//! 7. extract focus blocks from the Plan section
//! 8. trim

mod document;
mod entry;
mod error;
mod escape;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

pub use document::{NormalizedDocument, PLAN_HEADING, Section, SectionKind};
pub use entry::{ClockTime, FOCUS_MARKER, FocusBlock, PlanEntry};
pub use error::ScheduleError;
pub use escape::{is_escaped, strip_debug_wrapper, unescape};

use crate::llm::RawResponse;

/// Result of normalizing one completion response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Normalized {
    pub target_date: NaiveDate,
    pub document: NormalizedDocument,
    pub focus_blocks: Vec<FocusBlock>,
}

impl Normalized {
    /// Canonical markdown of the document
    pub fn markdown(&self) -> String {
        self.document.to_markdown()
    }
}

/// Normalize a completion response into a day plan for `target_date`
pub fn normalize(raw: &RawResponse, target_date: NaiveDate) -> Result<Normalized, ScheduleError> {
    debug!(%target_date, "normalize: called");
    // Only a wrapped response is a printed representation; plain text is never decoded
    let text = match strip_debug_wrapper(raw.first_text()) {
        Some(inner) if is_escaped(&inner) => {
            debug!("normalize: decoding escaped response");
            unescape(&inner)?
        }
        Some(inner) => inner,
        None => raw.first_text().to_string(),
    };

    let start = text.find(PLAN_HEADING).ok_or(ScheduleError::MissingHeading {
        heading: PLAN_HEADING,
    })?;
    if start > 0 {
        debug!(preamble_len = start, "normalize: dropping preamble");
    }

    let document = NormalizedDocument::from_plan_text(&text[start..]);
    let focus_blocks = document.focus_blocks();
    info!(
        %target_date,
        sections = document.sections().len(),
        focus_blocks = focus_blocks.len(),
        "Normalized schedule"
    );

    Ok(Normalized {
        target_date,
        document,
        focus_blocks,
    })
}

/// Normalize plain text, e.g. a saved response file
pub fn normalize_text(text: &str, target_date: NaiveDate) -> Result<Normalized, ScheduleError> {
    normalize(&RawResponse::Text(text.to_string()), target_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[test]
    fn test_preamble_removed() {
        let raw = "Sure! Here is your plan for tomorrow.\n\n# Day Planner\n- [ ] [9:00am-10:00am] Email\n\n# Thought Dump";
        let normalized = normalize_text(raw, date()).unwrap();
        let markdown = normalized.markdown();
        assert!(markdown.starts_with("# Day Planner"));
        assert!(!markdown.contains("Sure!"));
    }

    #[test]
    fn test_missing_heading_is_malformed() {
        let err = normalize_text("I could not build a plan, sorry.", date()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_debug_wrapper_unwrapped() {
        let raw = RawResponse::Text(r##"TextBlock(text="# Day Planner\n- [ ] [9:00am-11:00am] Task A")"##.to_string());
        let normalized = normalize(&raw, date()).unwrap();
        assert_eq!(normalized.markdown(), "# Day Planner\n- [ ] [9:00am-11:00am] Task A");
    }

    #[test]
    fn test_blocks_use_first_element() {
        let raw = RawResponse::Blocks(vec![
            "# Day Planner\n- [ ] [1:00pm-3:00pm] ### Focus Block: Write report".to_string(),
            "# Day Planner\n- [ ] ignored".to_string(),
        ]);
        let normalized = normalize(&raw, date()).unwrap();
        assert_eq!(normalized.focus_blocks.len(), 1);
        assert!(!normalized.markdown().contains("ignored"));
    }

    #[test]
    fn test_empty_blocks_are_malformed() {
        let err = normalize(&RawResponse::Blocks(vec![]), date()).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_bad_escape_is_fatal() {
        let err = normalize_text(r#"TextBlock(text="\n\x9")"#, date()).unwrap_err();
        assert!(matches!(err, ScheduleError::Unescape { .. }));
    }

    #[test]
    fn test_plain_single_line_is_not_decoded() {
        let raw = r"# Day Planner - [ ] [9:00am-10:00am] copy C:\\tmp to backup";
        let once = normalize_text(raw, date()).unwrap().markdown();
        assert_eq!(once, raw);
        let twice = normalize_text(&once, date()).unwrap().markdown();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_focus_block_round_trip() {
        let raw = "# Day Planner\n- [ ] [2:00pm-4:00pm] ### Focus Block: Write report";
        let normalized = normalize_text(raw, date()).unwrap();
        assert_eq!(
            normalized.focus_blocks,
            vec![FocusBlock {
                start: "2:00pm".to_string(),
                end: "4:00pm".to_string(),
                description: "Write report".to_string(),
            }]
        );
    }

    #[test]
    fn test_no_focus_blocks_is_ok() {
        let normalized = normalize_text("# Day Planner\n- [ ] [9:00am-10:00am] Email", date()).unwrap();
        assert!(normalized.focus_blocks.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let raw = "Preamble\n# Day Planner\n# Schedule for Monday\n- [ ] [9:00am-10:00am] Email\n\n# Thought Dump\n1. stuff\n\n# Things I'm Grateful For...\n1. things\n# Scary thing(s) I did today...\n1. jumped\n\n";
        let once = normalize_text(raw, date()).unwrap().markdown();
        let twice = normalize_text(&once, date()).unwrap().markdown();
        assert_eq!(once, twice);
    }
}
