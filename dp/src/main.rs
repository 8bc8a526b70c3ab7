//! Dayplanner - kanban board in, tomorrow's plan out
//!
//! CLI entry point. Meant to run once a night from a scheduler.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use dayplanner::calendar::{CalendarService, GoogleCalendar};
use dayplanner::cli::{Cli, Command, RunArgs, generate_after_help, get_log_path};
use dayplanner::config::Config;
use dayplanner::llm::create_client;
use dayplanner::planner::{InputAssembler, Planner, RunOptions, RunOutcome, RunReport, render_prompt, tomorrow_in};
use dayplanner::prompts::PromptLoader;
use dayplanner::schedule::normalize_text;

fn setup_logging(log_dir: &Path, cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_path = get_log_path(log_dir);
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .context(format!("Failed to open log file {}", log_path.display()))?;

    // Everything goes to the daily file; warnings and errors also reach the terminal
    let writer = Arc::new(log_file).and(std::io::stderr.with_max_level(tracing::Level::WARN));

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?}, file: {})", level, log_path.display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Build command with dynamic after_help that shows log file and disable marker
    let cmd = Cli::command().after_help(generate_after_help());

    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    // Load log settings from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    let log_dir = Config::load_log_dir(cli.config.as_ref());

    setup_logging(&log_dir, cli.log_level.as_deref(), config_log_level.as_deref())
        .context("Failed to setup logging")?;

    let result = dispatch(cli).await;
    if let Err(e) = &result {
        error!("dp failed: {:?}", e);
    }
    result
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command.unwrap_or_else(|| Command::Run(RunArgs::default())) {
        Command::Run(args) => cmd_run(config, args).await,
        Command::Normalize { file, date, json } => cmd_normalize(&file, target_date(&config, date)?, json),
        Command::Events { date } => cmd_events(&config, target_date(&config, date)?).await,
        Command::Prompt { date, no_calendar } => {
            let date = target_date(&config, date)?;
            let calendar = if no_calendar { None } else { connect_calendar(&config) };
            cmd_prompt(&config, calendar, date).await
        }
    }
}

/// The requested date, or tomorrow in the configured timezone
///
/// The timezone is only resolved when no date was given.
fn target_date(config: &Config, date: Option<NaiveDate>) -> Result<NaiveDate> {
    match date {
        Some(date) => Ok(date),
        None => Ok(tomorrow_in(config.calendar.tz()?)),
    }
}

/// Calendar client when enabled and a token is available
fn connect_calendar(config: &Config) -> Option<Arc<dyn CalendarService>> {
    if !config.calendar.enabled {
        debug!("connect_calendar: disabled in config");
        return None;
    }
    match GoogleCalendar::from_config(&config.calendar) {
        Ok(calendar) => Some(Arc::new(calendar)),
        Err(e) => {
            warn!("Calendar unavailable, continuing without it: {}", e);
            None
        }
    }
}

async fn cmd_run(config: Config, args: RunArgs) -> Result<()> {
    debug!(?args, "cmd_run: called");
    config.validate()?;

    let tz = config.calendar.tz()?;
    let target_date = args.date.unwrap_or_else(|| tomorrow_in(tz));
    let llm = create_client(&config.llm)?;
    let calendar = if args.no_calendar { None } else { connect_calendar(&config) };

    let planner = Planner::new(config, tz, llm, calendar);
    let options = RunOptions {
        target_date,
        dry_run: args.dry_run,
        no_delay: args.no_delay,
    };

    match planner.run(&options).await? {
        RunOutcome::Skipped { marker } => {
            println!("{} {} exists, nothing to do", "Skipped:".yellow(), marker.display());
        }
        RunOutcome::Completed(report) => {
            if args.dry_run {
                println!("{}\n", report.normalized.markdown());
            }
            print_report(&report);
        }
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("{} {}", "Planned".green().bold(), report.target_date.format("%A, %B %-d, %Y"));
    match &report.journal_path {
        Some(path) => println!("  {:16} {}", "Journal", path.display()),
        None => println!("  {:16} {}", "Journal", "not written (dry run)".dimmed()),
    }
    println!("  {:16} {}", "Focus blocks", report.focus_blocks());
    println!("  {:16} {}", "Events created", report.created.len());
    for event in &report.created {
        println!("    {} {}", "+".green(), event.html_link);
    }
    if !report.rejected.is_empty() {
        println!("  {:16} {}", "Blocks rejected", report.rejected.len().to_string().yellow());
        for rejected in &report.rejected {
            println!("    {} {}", "-".yellow(), rejected);
        }
    }
    if !report.write_failures.is_empty() {
        println!("  {:16} {}", "Writes failed", report.write_failures.len().to_string().red());
        for (summary, reason) in &report.write_failures {
            println!("    {} {}: {}", "!".red(), summary, reason);
        }
    }
    println!("  {:16} {}", "Run", report.run_id.to_string().dimmed());
}

fn cmd_normalize(file: &Path, date: NaiveDate, json: bool) -> Result<()> {
    debug!(?file, %date, json, "cmd_normalize: called");
    let raw = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let normalized = normalize_text(&raw, date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&normalized)?);
        return Ok(());
    }

    println!("{}", normalized.markdown());
    println!();
    if normalized.focus_blocks.is_empty() {
        println!("{}", "No focus blocks.".dimmed());
    } else {
        println!("{}", "Focus blocks:".bold());
        for block in &normalized.focus_blocks {
            println!("  {}-{} {}", block.start.cyan(), block.end.cyan(), block.description);
        }
    }
    for missing in normalized.document.missing_sections() {
        println!("{} missing {:?} section", "Warning:".yellow(), missing);
    }
    Ok(())
}

async fn cmd_events(config: &Config, date: NaiveDate) -> Result<()> {
    debug!(%date, "cmd_events: called");
    let calendar = GoogleCalendar::from_config(&config.calendar)?;
    let events = calendar.list_events(date).await?;

    println!("{} {}", "Events".bold(), date.format("%A, %B %-d, %Y"));
    if events.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for event in &events {
        println!("  {}", event.prompt_line().trim_start_matches("- "));
    }
    Ok(())
}

async fn cmd_prompt(config: &Config, calendar: Option<Arc<dyn CalendarService>>, date: NaiveDate) -> Result<()> {
    debug!(%date, "cmd_prompt: called");
    let inputs = InputAssembler::new(&config.planner.kanban_path, calendar)
        .assemble(date)
        .await?;
    let prompt = render_prompt(&PromptLoader::new(&config.planner.prompt_dir), &inputs, date)?;

    println!("{}", "System:".bold());
    println!("{}\n", prompt.system);
    println!("{}", "User:".bold());
    println!("{}", prompt.user);
    Ok(())
}
