//! Normalized day-plan document
//!
//! The document is rebuilt line by line: every level-one heading opens a new
//! section, and each section owns the lines up to the next heading. Reflective
//! sections drop whatever the model wrote into them.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::entry::{FocusBlock, PlanEntry};

/// Heading that opens the plan; everything before it is preamble
pub const PLAN_HEADING: &str = "# Day Planner";

/// Prefix of the date heading the model sometimes adds
const STRAY_DATE_HEADING: &str = "# Schedule for";

/// The sections a day plan is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionKind {
    Plan,
    ThoughtDump,
    Gratitude,
    Challenge,
    Notes,
    /// Any other level-one heading
    Other,
}

impl SectionKind {
    /// Sections every generated plan should carry
    pub const REQUIRED: [SectionKind; 4] = [
        SectionKind::Plan,
        SectionKind::ThoughtDump,
        SectionKind::Gratitude,
        SectionKind::Challenge,
    ];

    const KNOWN: [SectionKind; 5] = [
        SectionKind::Plan,
        SectionKind::ThoughtDump,
        SectionKind::Gratitude,
        SectionKind::Challenge,
        SectionKind::Notes,
    ];

    /// Canonical heading line
    pub fn heading(&self) -> Option<&'static str> {
        match self {
            SectionKind::Plan => Some(PLAN_HEADING),
            SectionKind::ThoughtDump => Some("# Thought Dump"),
            SectionKind::Gratitude => Some("# Things I'm Grateful For..."),
            SectionKind::Challenge => Some("# Scary thing(s) I did today..."),
            SectionKind::Notes => Some("# Notes"),
            SectionKind::Other => None,
        }
    }

    /// Titles accepted for this section besides the canonical one
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Gratitude => &["Gratitude"],
            SectionKind::Challenge => &["Scary things I did today", "Scary thing I did today"],
            _ => &[],
        }
    }

    /// Sections kept empty for end-of-day journaling
    pub fn is_reflective(&self) -> bool {
        matches!(
            self,
            SectionKind::ThoughtDump | SectionKind::Gratitude | SectionKind::Challenge
        )
    }

    /// Classify a line as a level-one heading
    fn classify(line: &str) -> Option<SectionKind> {
        let title = line.trim().strip_prefix("# ")?;
        let key = heading_key(title);

        let kind = Self::KNOWN
            .into_iter()
            .find(|kind| {
                kind.heading()
                    .and_then(|h| h.strip_prefix("# "))
                    .into_iter()
                    .chain(kind.aliases().iter().copied())
                    .any(|candidate| heading_key(candidate) == key)
            })
            .unwrap_or(SectionKind::Other);
        Some(kind)
    }
}

/// Comparison key for heading titles: case, curly apostrophes and trailing
/// punctuation do not matter
fn heading_key(title: &str) -> String {
    title
        .trim()
        .replace('\u{2019}', "'")
        .to_lowercase()
        .trim_end_matches(|c: char| c == '.' || c == ':' || c.is_whitespace())
        .to_string()
}

fn is_stray_date_heading(line: &str) -> bool {
    line.strip_prefix(STRAY_DATE_HEADING)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
}

/// One heading and the lines under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    /// Heading line as written
    pub heading: String,
    /// Body lines as written; always empty for reflective sections
    pub body: Vec<String>,
}

impl Section {
    fn open(kind: SectionKind, heading: &str) -> Self {
        Self {
            kind,
            heading: heading.to_string(),
            body: Vec::new(),
        }
    }

    fn push(&mut self, line: &str) {
        if !self.kind.is_reflective() {
            self.body.push(line.to_string());
        }
    }
}

/// A day plan with a fixed section layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDocument {
    sections: Vec<Section>,
}

impl NormalizedDocument {
    /// Build the document from text that starts at the plan heading
    pub(crate) fn from_plan_text(text: &str) -> Self {
        debug!(text_len = text.len(), "NormalizedDocument::from_plan_text: called");
        let mut sections: Vec<Section> = Vec::new();

        for line in text.trim().lines() {
            if is_stray_date_heading(line) {
                debug!(%line, "from_plan_text: dropping stray date heading");
                continue;
            }

            // The first line is the plan heading by construction
            let heading = if sections.is_empty() {
                Some(SectionKind::Plan)
            } else {
                SectionKind::classify(line)
            };

            match (heading, sections.last_mut()) {
                (Some(kind), _) => {
                    debug!(?kind, "from_plan_text: opening section");
                    sections.push(Section::open(kind, line));
                }
                (None, Some(current)) => current.push(line),
                (None, None) => {}
            }
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Non-blank lines of every Plan section, classified
    pub fn plan_entries(&self) -> Vec<PlanEntry> {
        self.sections
            .iter()
            .filter(|s| s.kind == SectionKind::Plan)
            .flat_map(|s| s.body.iter())
            .filter(|line| !line.trim().is_empty())
            .map(|line| PlanEntry::parse(line))
            .collect()
    }

    /// Focus blocks in document order
    pub fn focus_blocks(&self) -> Vec<FocusBlock> {
        self.plan_entries()
            .into_iter()
            .filter_map(|entry| match entry {
                PlanEntry::Focus(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    /// Required sections that never appeared
    pub fn missing_sections(&self) -> Vec<SectionKind> {
        SectionKind::REQUIRED
            .into_iter()
            .filter(|kind| !self.sections.iter().any(|s| s.kind == *kind))
            .collect()
    }

    /// Canonical markdown text
    pub fn to_markdown(&self) -> String {
        let mut lines: Vec<&str> = Vec::new();
        for section in &self.sections {
            lines.push(&section.heading);
            if section.kind.is_reflective() {
                lines.push("");
            } else {
                lines.extend(section.body.iter().map(String::as_str));
            }
        }
        lines.join("\n").trim().to_string()
    }
}

impl fmt::Display for NormalizedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "# Day Planner
- [ ] [8:30am-9:00am] Get ready
- [ ] [9:00am-11:00am] ### Focus Block: Leetcode

# Thought Dump
1. I was thinking
2. about things

# Things I'm Grateful For...
1. Coffee

# Scary thing(s) I did today...
1. Public speaking";

    #[test]
    fn test_reflective_sections_emptied() {
        let doc = NormalizedDocument::from_plan_text(FULL);
        assert_eq!(
            doc.to_markdown(),
            "# Day Planner
- [ ] [8:30am-9:00am] Get ready
- [ ] [9:00am-11:00am] ### Focus Block: Leetcode

# Thought Dump

# Things I'm Grateful For...

# Scary thing(s) I did today..."
        );
    }

    #[test]
    fn test_reflective_bodies_are_empty() {
        let doc = NormalizedDocument::from_plan_text(FULL);
        for section in doc.sections().iter().filter(|s| s.kind.is_reflective()) {
            assert!(section.body.is_empty(), "{:?}", section.kind);
        }
    }

    #[test]
    fn test_stray_date_heading_removed() {
        let doc = NormalizedDocument::from_plan_text(
            "# Day Planner\n# Schedule for Tuesday, March 5\n- [ ] [9:00am-10:00am] Email",
        );
        assert_eq!(doc.to_markdown(), "# Day Planner\n- [ ] [9:00am-10:00am] Email");
    }

    #[test]
    fn test_schedule_heading_lookalike_kept() {
        let doc = NormalizedDocument::from_plan_text("# Day Planner\n# Schedules are hard");
        assert_eq!(doc.sections().len(), 2);
        assert_eq!(doc.sections()[1].kind, SectionKind::Other);
    }

    #[test]
    fn test_notes_and_other_sections_kept_verbatim() {
        let text = "# Day Planner\n- [ ] [9:00am-10:00am] Email\n\n# Notes\nBring umbrella\n\n# Extra\nstuff";
        let doc = NormalizedDocument::from_plan_text(text);
        assert_eq!(doc.to_markdown(), text);
        let kinds: Vec<_> = doc.sections().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![SectionKind::Plan, SectionKind::Notes, SectionKind::Other]);
    }

    #[test]
    fn test_heading_variants_recognized() {
        assert_eq!(SectionKind::classify("# thought dump:"), Some(SectionKind::ThoughtDump));
        assert_eq!(
            SectionKind::classify("# Things I\u{2019}m grateful for"),
            Some(SectionKind::Gratitude)
        );
        assert_eq!(
            SectionKind::classify("# Scary things I did today"),
            Some(SectionKind::Challenge)
        );
        assert_eq!(SectionKind::classify("## Thought Dump"), None);
        assert_eq!(SectionKind::classify("- [ ] task"), None);
    }

    #[test]
    fn test_missing_sections() {
        let doc = NormalizedDocument::from_plan_text("# Day Planner\n- [ ] [9:00am-10:00am] Email\n# Thought Dump");
        assert_eq!(
            doc.missing_sections(),
            vec![SectionKind::Gratitude, SectionKind::Challenge]
        );
    }

    #[test]
    fn test_focus_blocks_only_from_plan() {
        let text = "# Day Planner
- [ ] [9:00am-11:00am] ### Focus Block: Deep work

# Notes
- [ ] [1:00pm-2:00pm] ### Focus Block: Not a plan line";
        let blocks = NormalizedDocument::from_plan_text(text).focus_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].description, "Deep work");
    }

    #[test]
    fn test_plan_entries_skip_blank_lines() {
        let doc = NormalizedDocument::from_plan_text("# Day Planner\n\n- [ ] [9:00am-10:00am] Email\n\nStretch\n");
        assert_eq!(doc.plan_entries().len(), 2);
    }
}
