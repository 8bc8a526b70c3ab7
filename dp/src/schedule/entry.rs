//! Plan entries, focus blocks and clock tokens

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Marker that promotes a timeboxed entry into a focus block
pub const FOCUS_MARKER: &str = "### Focus Block:";

/// `- [ ] [<start>-<end>] <label>`; clock tokens are `H:MM` or `HH:MM` with an
/// optional am/pm suffix
static TIMEBOXED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^- \[(?P<check>[ xX])\] \[(?P<start>[0-9]{1,2}:[0-9]{2}(?i:am|pm)?)-(?P<end>[0-9]{1,2}:[0-9]{2}(?i:am|pm)?)\] (?P<label>.*)$",
    )
    .expect("timeboxed entry pattern is valid")
});

/// A plan entry promoted to a calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FocusBlock {
    /// Start token as written, e.g. `2:00pm`
    pub start: String,
    /// End token as written
    pub end: String,
    pub description: String,
}

/// One non-blank line of the Plan section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlanEntry {
    /// `- [ ] [start-end] label`
    Timeboxed { start: String, end: String, label: String },
    /// `- [ ] [start-end] ### Focus Block: description`
    Focus(FocusBlock),
    /// Anything else, carried verbatim
    Text(String),
}

impl PlanEntry {
    /// Classify a single plan line
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(caps) = TIMEBOXED.captures(trimmed) else {
            return PlanEntry::Text(trimmed.to_string());
        };

        let start = caps["start"].to_string();
        let end = caps["end"].to_string();
        let label = caps["label"].trim();

        if &caps["check"] == " "
            && let Some(rest) = label.strip_prefix(FOCUS_MARKER)
        {
            let description = rest.trim();
            if !description.is_empty() {
                debug!(%start, %end, %description, "PlanEntry::parse: focus block");
                return PlanEntry::Focus(FocusBlock {
                    start,
                    end,
                    description: description.to_string(),
                });
            }
        }

        PlanEntry::Timeboxed {
            start,
            end,
            label: label.to_string(),
        }
    }

    /// The focus block carried by this entry, if any
    pub fn as_focus(&self) -> Option<&FocusBlock> {
        match self {
            PlanEntry::Focus(block) => Some(block),
            _ => None,
        }
    }
}

/// A clock-of-day value parsed from a plan token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClockTime {
    hour: u32,
    minute: u32,
}

impl ClockTime {
    /// Parse `H:MM`, `HH:MM`, `H:MMam`, `HH:MMpm` (suffix case-insensitive)
    ///
    /// With a suffix the hour must be 1-12. Without one the token is read as a
    /// 24-hour value.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim().to_ascii_lowercase();
        let (digits, meridiem) = if let Some(rest) = token.strip_suffix("am") {
            (rest, Some(false))
        } else if let Some(rest) = token.strip_suffix("pm") {
            (rest, Some(true))
        } else {
            (token.as_str(), None)
        };

        let (h, m) = digits.split_once(':')?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return None;
        }
        let hour: u32 = h.parse().ok()?;
        let minute: u32 = m.parse().ok()?;
        if minute > 59 {
            return None;
        }

        let hour = match meridiem {
            Some(pm) => {
                if !(1..=12).contains(&hour) {
                    return None;
                }
                hour % 12 + if pm { 12 } else { 0 }
            }
            None if hour <= 23 => hour,
            None => return None,
        };

        Some(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // hour and minute are range-checked in parse
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hour, suffix) = match self.hour {
            0 => (12, "am"),
            h @ 1..=11 => (h, "am"),
            12 => (12, "pm"),
            h => (h - 12, "pm"),
        };
        write!(f, "{}:{:02}{}", hour, self.minute, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_focus_block() {
        let entry = PlanEntry::parse("- [ ] [2:00pm-4:00pm] ### Focus Block: Write report");
        assert_eq!(
            entry,
            PlanEntry::Focus(FocusBlock {
                start: "2:00pm".to_string(),
                end: "4:00pm".to_string(),
                description: "Write report".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_focus_block_trims_description() {
        let entry = PlanEntry::parse("- [ ] [9:00AM-11:30AM] ### Focus Block:   Leetcode practice   ");
        let block = entry.as_focus().expect("focus block");
        assert_eq!(block.start, "9:00AM");
        assert_eq!(block.end, "11:30AM");
        assert_eq!(block.description, "Leetcode practice");
    }

    #[test]
    fn test_parse_timeboxed_entry() {
        let entry = PlanEntry::parse("- [ ] [8:30am-9:00am] Get ready");
        assert_eq!(
            entry,
            PlanEntry::Timeboxed {
                start: "8:30am".to_string(),
                end: "9:00am".to_string(),
                label: "Get ready".to_string(),
            }
        );
        assert!(entry.as_focus().is_none());
    }

    #[test]
    fn test_checked_focus_line_is_not_promoted() {
        let entry = PlanEntry::parse("- [x] [2:00pm-4:00pm] ### Focus Block: Done already");
        assert!(matches!(entry, PlanEntry::Timeboxed { .. }));
    }

    #[test]
    fn test_focus_marker_without_description_is_timeboxed() {
        let entry = PlanEntry::parse("- [ ] [2:00pm-4:00pm] ### Focus Block:   ");
        assert!(matches!(entry, PlanEntry::Timeboxed { .. }));
    }

    #[test]
    fn test_near_miss_lines_are_text() {
        for line in [
            "- [ ] [2pm-4pm] ### Focus Block: No minutes",
            "- [ ] 2:00pm-4:00pm ### Focus Block: No brackets",
            "[2:00pm-4:00pm] ### Focus Block: No checkbox",
            "- [ ] [٢:00pm-4:00pm] ### Focus Block: Arabic-Indic digit",
            "Take a walk",
        ] {
            assert!(matches!(PlanEntry::parse(line), PlanEntry::Text(_)), "{}", line);
        }
    }

    #[test]
    fn test_clock_parse_twelve_hour() {
        assert_eq!(ClockTime::parse("2:00pm").map(|t| t.hour()), Some(14));
        assert_eq!(ClockTime::parse("12:00am").map(|t| t.hour()), Some(0));
        assert_eq!(ClockTime::parse("12:30PM").map(|t| (t.hour(), t.minute())), Some((12, 30)));
        assert_eq!(ClockTime::parse("09:15am").map(|t| t.hour()), Some(9));
    }

    #[test]
    fn test_clock_parse_twenty_four_hour() {
        assert_eq!(ClockTime::parse("14:45").map(|t| (t.hour(), t.minute())), Some((14, 45)));
        assert_eq!(ClockTime::parse("0:00").map(|t| t.hour()), Some(0));
    }

    #[test]
    fn test_clock_parse_rejects_garbage() {
        for token in ["13:00pm", "0:00am", "24:00", "9:60", "9:5", "9", "ab:cd", ":30", "123:00"] {
            assert!(ClockTime::parse(token).is_none(), "{}", token);
        }
    }

    #[test]
    fn test_clock_display() {
        assert_eq!(ClockTime::parse("14:05").unwrap().to_string(), "2:05pm");
        assert_eq!(ClockTime::parse("12:00am").unwrap().to_string(), "12:00am");
        assert_eq!(ClockTime::parse("12:00pm").unwrap().to_string(), "12:00pm");
    }
}
