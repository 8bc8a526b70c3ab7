//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to
//! embedded defaults.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::calendar::{CalendarEvent, format_events_for_prompt};

/// Values available to the plan template
#[derive(Debug, Clone, Serialize)]
pub struct PromptContext {
    /// Task board text, verbatim
    pub kanban: String,
    /// Formatted calendar events, or a note that there are none
    pub events: String,
    pub has_events: bool,
    /// `2024-06-12`
    pub date: String,
    /// `Wednesday`
    pub weekday: String,
    pub is_sunday: bool,
}

impl PromptContext {
    pub fn new(kanban: impl Into<String>, events: &[CalendarEvent], target_date: NaiveDate) -> Self {
        debug!(event_count = events.len(), %target_date, "PromptContext::new: called");
        Self {
            kanban: kanban.into(),
            events: format_events_for_prompt(events),
            has_events: !events.is_empty(),
            date: target_date.format("%Y-%m-%d").to_string(),
            weekday: target_date.format("%A").to_string(),
            is_sunday: target_date.weekday() == Weekday::Sun,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.dayplanner/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers `<prompt_dir>/{name}.pmt` when present
    pub fn new(prompt_dir: impl AsRef<Path>) -> Self {
        let prompt_dir = prompt_dir.as_ref();
        let exists = prompt_dir.is_dir();
        debug!(?prompt_dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: exists.then(|| prompt_dir.to_path_buf()),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    /// Markdown goes into the prompt as-is, not HTML-escaped
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `<prompt-dir>/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(user_dir) = &self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                info!("Using prompt override {}", path.display());
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found in user override");
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, date = %context.date, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// The rendered day plan request
    pub fn plan_prompt(&self, context: &PromptContext) -> Result<String> {
        self.render("plan", context)
    }

    /// The system prompt, not templated
    pub fn system_prompt(&self) -> Result<String> {
        Ok(self.load_template("system")?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn wednesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()
    }

    fn standup() -> CalendarEvent {
        let tz = chrono_tz::America::Los_Angeles;
        CalendarEvent::new(
            "Standup",
            tz.with_ymd_and_hms(2024, 6, 12, 9, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2024, 6, 12, 9, 15, 0).unwrap(),
            false,
        )
    }

    #[test]
    fn test_prompt_context() {
        let ctx = PromptContext::new("## High\n- Ship it", &[standup()], wednesday());
        assert_eq!(ctx.date, "2024-06-12");
        assert_eq!(ctx.weekday, "Wednesday");
        assert!(ctx.has_events);
        assert!(!ctx.is_sunday);
        assert_eq!(ctx.events, "- 9:00am-9:15am: Standup");

        let sunday = PromptContext::new("", &[], NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());
        assert!(sunday.is_sunday);
        assert!(!sunday.has_events);
    }

    #[test]
    fn test_plan_prompt_embeds_inputs() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::new("## High\n- Fix <parser> & tests", &[standup()], wednesday());

        let prompt = loader.plan_prompt(&ctx).unwrap();

        assert!(prompt.contains("Wednesday, 2024-06-12"));
        // not HTML-escaped
        assert!(prompt.contains("- Fix <parser> & tests"));
        assert!(prompt.contains("- 9:00am-9:15am: Standup"));
        assert!(prompt.contains("### Focus Block:"));
        assert!(!prompt.contains("keep 1-4pm for Playspace"));
    }

    #[test]
    fn test_plan_prompt_without_events() {
        let loader = PromptLoader::embedded_only();
        let ctx = PromptContext::new("board", &[], NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());

        let prompt = loader.plan_prompt(&ctx).unwrap();

        assert!(prompt.contains("No calendar events scheduled."));
        assert!(prompt.contains("keep 1-4pm for Playspace"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("plan.pmt"), "Plan {{weekday}} from {{kanban}}").unwrap();

        let loader = PromptLoader::new(dir.path());
        let ctx = PromptContext::new("board", &[], wednesday());

        assert_eq!(loader.plan_prompt(&ctx).unwrap(), "Plan Wednesday from board");
        // system.pmt not overridden, embedded one used
        assert!(loader.system_prompt().unwrap().contains("daily schedules"));
    }

    #[test]
    fn test_missing_override_dir_uses_embedded() {
        let loader = PromptLoader::new("/nonexistent/prompts");
        assert!(loader.user_dir.is_none());
        assert!(loader.system_prompt().is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
