//! Planner run pipeline
//!
//! inputs -> prompt -> completion -> normalize -> journal -> calendar events
//!
//! The journal is written before any event is created, so a calendar failure
//! never loses the day's document. Event creation failures are logged and
//! skipped; the run still succeeds.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{Instrument, debug, error, info, warn};
use uuid::Uuid;

mod context;
mod error;
mod inputs;

pub use context::{RunContext, tomorrow_in};
pub use error::RunError;
pub use inputs::{InputAssembler, Inputs};

use crate::calendar::{CalendarService, CreatedEvent, EventRequest, MappingError, map_to_events};
use crate::config::Config;
use crate::journal::JournalWriter;
use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, Message, StopReason};
use crate::prompts::{PromptContext, PromptLoader};
use crate::retry::{RetryPolicy, retry};
use crate::schedule::{Normalized, normalize};

/// Per-invocation switches
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub target_date: NaiveDate,
    /// Print the document, write nothing, create nothing
    pub dry_run: bool,
    /// Skip the startup delay
    pub no_delay: bool,
}

/// A rendered plan request
#[derive(Debug, Clone)]
pub struct PlanPrompt {
    pub system: String,
    pub user: String,
}

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// Disable marker present, nothing done
    Skipped { marker: PathBuf },
    Completed(RunReport),
}

/// Summary of a completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub target_date: NaiveDate,
    pub normalized: Normalized,
    /// `None` on a dry run
    pub journal_path: Option<PathBuf>,
    pub created: Vec<CreatedEvent>,
    pub rejected: Vec<MappingError>,
    /// Event summary and the error that stopped it
    pub write_failures: Vec<(String, String)>,
}

impl RunReport {
    pub fn focus_blocks(&self) -> usize {
        self.normalized.focus_blocks.len()
    }
}

pub struct Planner {
    config: Config,
    llm: Arc<dyn LlmClient>,
    calendar: Option<Arc<dyn CalendarService>>,
    inputs: InputAssembler,
    prompts: PromptLoader,
    tz: Tz,
}

impl Planner {
    pub fn new(
        config: Config,
        tz: Tz,
        llm: Arc<dyn LlmClient>,
        calendar: Option<Arc<dyn CalendarService>>,
    ) -> Self {
        debug!(model = llm.model(), calendar = calendar.is_some(), %tz, "Planner::new: called");
        let inputs = InputAssembler::new(&config.planner.kanban_path, calendar.clone());
        let prompts = PromptLoader::new(&config.planner.prompt_dir);
        Self {
            config,
            llm,
            calendar,
            inputs,
            prompts,
            tz,
        }
    }

    /// Run the whole pipeline for `options.target_date`
    pub async fn run(&self, options: &RunOptions) -> Result<RunOutcome, RunError> {
        let ctx = RunContext::new(options.target_date);
        let span = ctx.span().clone();
        self.run_in(&ctx, options).instrument(span).await
    }

    async fn run_in(&self, ctx: &RunContext, options: &RunOptions) -> Result<RunOutcome, RunError> {
        let marker = &self.config.planner.disable_marker;
        if marker.exists() {
            info!("Disable marker {} present, skipping run", marker.display());
            return Ok(RunOutcome::Skipped { marker: marker.clone() });
        }

        info!(model = self.llm.model(), dry_run = options.dry_run, "Planning {}", ctx.target_date());

        let delay = self.config.planner.startup_delay();
        if !options.no_delay && !delay.is_zero() {
            info!("Waiting {:?} before first network call", delay);
            tokio::time::sleep(delay).await;
        }

        let inputs = self.inputs.assemble(ctx.target_date()).await?;
        let prompt = render_prompt(&self.prompts, &inputs, ctx.target_date())?;
        let response = self.request_plan(&prompt).await?;

        let normalized = normalize(&response.content, ctx.target_date())?;
        for missing in normalized.document.missing_sections() {
            warn!("Plan is missing the {:?} section", missing);
        }

        let journal_path = if options.dry_run {
            info!("Dry run, journal not written");
            None
        } else {
            let writer = JournalWriter::new(&self.config.planner.output_dir);
            Some(writer.write(ctx.target_date(), &normalized.document)?)
        };

        let mapped = map_to_events(&normalized.focus_blocks, ctx.target_date(), self.tz);
        let (created, write_failures) = if options.dry_run {
            info!("Dry run, {} focus-block events not created", mapped.requests.len());
            (Vec::new(), Vec::new())
        } else {
            self.publish(&mapped.requests).await
        };

        info!(
            focus_blocks = normalized.focus_blocks.len(),
            created = created.len(),
            rejected = mapped.rejected.len(),
            write_failures = write_failures.len(),
            "Run complete"
        );

        Ok(RunOutcome::Completed(RunReport {
            run_id: ctx.run_id(),
            target_date: ctx.target_date(),
            normalized,
            journal_path,
            created,
            rejected: mapped.rejected,
            write_failures,
        }))
    }

    /// One completion call under the configured retry policy
    async fn request_plan(&self, prompt: &PlanPrompt) -> Result<CompletionResponse, RunError> {
        let request = CompletionRequest {
            system_prompt: prompt.system.clone(),
            messages: vec![Message::user(prompt.user.clone())],
            max_tokens: self.config.llm.max_tokens,
            temperature: self.config.llm.temperature,
        };
        let policy = RetryPolicy::from(&self.config.planner.retry);
        debug!(?policy, prompt_len = prompt.user.len(), "request_plan: called");

        let response = retry(&policy, "Completion request", |attempt| {
            let llm = Arc::clone(&self.llm);
            let request = request.clone();
            async move {
                debug!(attempt, "request_plan: sending");
                llm.complete(request).await
            }
        })
        .await?;

        if response.stop_reason == StopReason::MaxTokens {
            warn!("Completion hit the max-tokens limit, plan may be truncated");
        }
        info!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            cost_usd = response.usage.cost_usd(self.llm.model()),
            "Received plan"
        );
        Ok(response)
    }

    /// Create each event in order; failures are logged and skipped, an auth
    /// failure ends the batch
    async fn publish(&self, requests: &[EventRequest]) -> (Vec<CreatedEvent>, Vec<(String, String)>) {
        let mut created = Vec::new();
        let mut failures = Vec::new();

        let Some(calendar) = &self.calendar else {
            if !requests.is_empty() {
                info!("Calendar disabled, {} focus-block events not created", requests.len());
            }
            return (created, failures);
        };

        for (index, request) in requests.iter().enumerate() {
            match calendar.create_event(request).await {
                Ok(event) => {
                    info!("Created event '{}' {}", request.summary, event.html_link);
                    created.push(event);
                }
                Err(e) if e.is_auth() => {
                    // every later insert would be refused the same way
                    let reason = format!("{} (refresh the calendar token)", e);
                    error!(
                        "Calendar refused the token, {} events not created: {:?}",
                        requests.len() - index,
                        e
                    );
                    failures.extend(requests[index..].iter().map(|r| (r.summary.clone(), reason.clone())));
                    break;
                }
                Err(e) => {
                    error!("Failed to create event '{}': {:?}", request.summary, e);
                    failures.push((request.summary.clone(), e.to_string()));
                }
            }
        }

        (created, failures)
    }
}

/// Render the plan request from assembled inputs
pub fn render_prompt(prompts: &PromptLoader, inputs: &Inputs, date: NaiveDate) -> Result<PlanPrompt, RunError> {
    debug!(%date, event_count = inputs.events.len(), "render_prompt: called");
    let context = PromptContext::new(inputs.kanban.clone(), &inputs.events, date);
    let user = prompts
        .plan_prompt(&context)
        .map_err(|e| RunError::Prompt(format!("{:#}", e)))?;
    let system = prompts
        .system_prompt()
        .map_err(|e| RunError::Prompt(format!("{:#}", e)))?;
    Ok(PlanPrompt { system, user })
}
