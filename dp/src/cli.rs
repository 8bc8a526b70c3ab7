//! CLI command definitions and subcommands

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::debug;

use crate::config::Config;

/// Dayplanner - turns a kanban board into tomorrow's plan
#[derive(Parser)]
#[command(
    name = "dp",
    about = "Plan tomorrow from a kanban board: journal file plus focus-block calendar events",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute, `run` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan the target day: journal file and focus-block events
    Run(RunArgs),

    /// Normalize a saved completion response and show its focus blocks
    Normalize {
        /// File holding the raw response text
        file: PathBuf,

        /// Date the plan is for (YYYY-MM-DD, default tomorrow)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print JSON instead of markdown
        #[arg(long)]
        json: bool,
    },

    /// List calendar events on the target date
    Events {
        /// Date to list (YYYY-MM-DD, default tomorrow)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Render the plan prompt without calling the completion service
    Prompt {
        /// Date to plan (YYYY-MM-DD, default tomorrow)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Leave calendar events out of the prompt
        #[arg(long)]
        no_calendar: bool,
    },
}

/// Flags for `dp run`
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Date to plan (YYYY-MM-DD, default tomorrow)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Print the plan; write no journal, create no events
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the startup delay
    #[arg(long)]
    pub no_delay: bool,

    /// Neither read nor write the calendar
    #[arg(long)]
    pub no_calendar: bool,
}

/// Daily log file path: `<log_dir>/dayplanner_YYYYMMDD.log`
pub fn get_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(format!("dayplanner_{}.log", Local::now().format("%Y%m%d")))
}

/// Help footer showing where things live and whether runs are disabled
///
/// Built before arguments are parsed, so it reflects the default config chain.
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let config = Config::load(None).unwrap_or_default();
    let marker = &config.planner.disable_marker;

    let marker_status = if marker.exists() {
        "present, runs are skipped".yellow().to_string()
    } else {
        "absent".green().to_string()
    };

    format!(
        "{}\n  {:16} {}\n  {:16} {} ({})",
        "Status:".bold(),
        "Log file",
        get_log_path(&config.log_dir()).display(),
        "Disable marker",
        marker.display(),
        marker_status,
    )
}
