//! Property tests for schedule normalization

use chrono::NaiveDate;
use dayplanner::schedule::{PLAN_HEADING, SectionKind, normalize_text};
use proptest::prelude::*;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
}

fn clock() -> impl Strategy<Value = String> {
    (1u32..=12, 0u32..60, prop_oneof![Just("am"), Just("pm")])
        .prop_map(|(hour, minute, suffix)| format!("{}:{:02}{}", hour, minute, suffix))
}

/// Free text with no headings, escapes or backslashes
fn words() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z ,]{0,30}"
}

fn plan_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (clock(), clock(), words()).prop_map(|(s, e, w)| format!("- [ ] [{}-{}] {}", s, e, w)),
        (clock(), clock(), words()).prop_map(|(s, e, w)| format!("- [ ] [{}-{}] ### Focus Block: {}", s, e, w)),
        (clock(), clock(), words()).prop_map(|(s, e, w)| format!("- [x] [{}-{}] {}", s, e, w)),
        words(),
        Just(String::new()),
    ]
}

fn numbered_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(words(), 0..5)
        .prop_map(|items| items.into_iter().enumerate().map(|(i, w)| format!("{}. {}", i + 1, w)).collect())
}

/// A response shaped like what the model returns: optional preamble, plan,
/// reflective sections with whatever the model put in them
fn response() -> impl Strategy<Value = String> {
    (
        prop::option::of(words()),
        prop::collection::vec(plan_line(), 0..12),
        numbered_list(),
        numbered_list(),
        numbered_list(),
        any::<bool>(),
    )
        .prop_map(|(preamble, plan, thoughts, gratitude, scary, date_heading)| {
            let mut text = String::new();
            if let Some(p) = preamble {
                text.push_str(&p);
                text.push_str("\n\n");
            }
            text.push_str(PLAN_HEADING);
            text.push('\n');
            if date_heading {
                text.push_str("# Schedule for Wednesday\n");
            }
            for line in plan {
                text.push_str(&line);
                text.push('\n');
            }
            for (heading, body) in [
                ("# Thought Dump", thoughts),
                ("# Things I'm Grateful For...", gratitude),
                ("# Scary thing(s) I did today...", scary),
            ] {
                text.push('\n');
                text.push_str(heading);
                text.push('\n');
                for line in body {
                    text.push_str(&line);
                    text.push('\n');
                }
            }
            text
        })
}

/// A whole plan on one line with Windows paths and other stray backslashes
fn single_line_response() -> impl Strategy<Value = String> {
    r"[a-zA-Z :\\]{0,40}".prop_map(|tail| format!("{} - [ ] [9:00am-10:00am] {}", PLAN_HEADING, tail))
}

proptest! {
    #[test]
    fn normalizing_twice_changes_nothing(raw in prop_oneof![response(), single_line_response()]) {
        let once = normalize_text(&raw, date()).unwrap();
        let twice = normalize_text(&once.markdown(), date()).unwrap();
        prop_assert_eq!(once.markdown(), twice.markdown());
        prop_assert_eq!(once.focus_blocks, twice.focus_blocks);
    }

    #[test]
    fn output_starts_at_plan_heading(raw in response()) {
        let markdown = normalize_text(&raw, date()).unwrap().markdown();
        prop_assert!(markdown.starts_with(PLAN_HEADING));
        prop_assert!(!markdown.contains("# Schedule for"));
        prop_assert_eq!(markdown.trim(), markdown.as_str());
    }

    #[test]
    fn reflective_sections_come_out_empty(raw in response()) {
        let normalized = normalize_text(&raw, date()).unwrap();
        for section in normalized.document.sections() {
            if section.kind.is_reflective() {
                prop_assert!(section.body.is_empty());
            }
        }
        prop_assert!(normalized.document.missing_sections().is_empty());
    }

    #[test]
    fn focus_blocks_match_marked_lines(plan in prop::collection::vec(plan_line(), 0..12)) {
        let expected = plan
            .iter()
            .filter(|line| line.starts_with("- [ ] [") && line.contains("### Focus Block: "))
            .count();
        let raw = format!("{}\n{}", PLAN_HEADING, plan.join("\n"));

        let normalized = normalize_text(&raw, date()).unwrap();

        prop_assert_eq!(normalized.focus_blocks.len(), expected);
        for block in &normalized.focus_blocks {
            prop_assert!(!block.description.is_empty());
            prop_assert_eq!(block.description.trim(), block.description.as_str());
        }
    }

    #[test]
    fn text_without_plan_heading_is_rejected(raw in "[a-z .,\n]{0,200}") {
        let err = normalize_text(&raw, date()).unwrap_err();
        prop_assert!(err.is_malformed());
    }
}

#[test]
fn single_line_backslashes_survive() {
    let raw = r"# Day Planner - [ ] [9:00am-10:00am] copy C:\\tmp to backup";
    let once = normalize_text(raw, date()).unwrap().markdown();
    let twice = normalize_text(&once, date()).unwrap().markdown();
    assert_eq!(once, raw);
    assert_eq!(twice, raw);
}

#[test]
fn plan_section_comes_first() {
    let normalized = normalize_text("# Day Planner\n- [ ] [9:00am-10:00am] Email\n# Notes\nbring umbrella", date()).unwrap();
    let kinds: Vec<SectionKind> = normalized.document.sections().iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SectionKind::Plan, SectionKind::Notes]);
}
