//! Dayplanner configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};

use crate::retry::{FailureKind, RetryPolicy};

/// Main dayplanner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Directory for daily log files
    #[serde(rename = "log-dir")]
    pub log_dir: Option<PathBuf>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Calendar configuration
    pub calendar: CalendarConfig,

    /// Planner run configuration
    pub planner: PlannerConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables and values are set correctly.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        self.llm.get_api_key()?;
        self.calendar.tz()?;
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_quiet(config_path)?.log_level
    }

    /// Log directory from the config file, or the default
    pub fn load_log_dir(config_path: Option<&PathBuf>) -> PathBuf {
        Self::load_quiet(config_path).unwrap_or_default().log_dir()
    }

    fn load_quiet(config_path: Option<&PathBuf>) -> Option<Self> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::default_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Directory for daily log files
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("dayplanner")
                .join("logs")
        })
    }

    /// Project-local `.dayplanner.yml`, then `~/.config/dayplanner/dayplanner.yml`
    fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".dayplanner.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("dayplanner").join("dayplanner.yml"));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4000,
            temperature: Some(0.7),
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.api_key_env
            )),
        }
    }
}

/// Calendar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Read events into the prompt and create focus-block events
    pub enabled: bool,

    /// Calendar API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Calendar to read from and write to
    #[serde(rename = "calendar-id")]
    pub calendar_id: String,

    /// IANA timezone for event times and the day window
    pub timezone: String,

    /// Environment variable holding an OAuth access token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// JSON token file used when the environment variable is unset
    #[serde(rename = "token-path")]
    pub token_path: Option<PathBuf>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.googleapis.com/calendar/v3".to_string(),
            calendar_id: "primary".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            token_env: "GOOGLE_CALENDAR_TOKEN".to_string(),
            token_path: dirs::config_dir().map(|d| d.join("dayplanner").join("token.json")),
            timeout_ms: 30_000,
        }
    }
}

/// Token file layout; both the `token` and `access_token` spellings are accepted
#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(alias = "access_token")]
    token: String,
}

impl CalendarConfig {
    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| eyre!("Invalid calendar timezone '{}': {}", self.timezone, e))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the access token: environment variable first, then token file
    pub fn access_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(&self.token_env)
            && !token.trim().is_empty()
        {
            return Ok(token.trim().to_string());
        }

        let Some(path) = &self.token_path else {
            return Err(eyre!(
                "Calendar token not found. Set {} or configure calendar.token-path.",
                self.token_env
            ));
        };

        let content = fs::read_to_string(path)
            .context(format!("Calendar token not found. Set {} or create {}", self.token_env, path.display()))?;
        let file: TokenFile = serde_json::from_str(&content)
            .context(format!("Failed to parse calendar token file {}", path.display()))?;
        Ok(file.token)
    }
}

/// Planner run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Kanban board markdown file
    #[serde(rename = "kanban-path")]
    pub kanban_path: PathBuf,

    /// Directory receiving `YYYY-MM-DD.md` journal files
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// Directory searched for a `plan.pmt` prompt override
    #[serde(rename = "prompt-dir")]
    pub prompt_dir: PathBuf,

    /// Run is skipped while this file exists in the working directory
    #[serde(rename = "disable-marker")]
    pub disable_marker: PathBuf,

    /// Wait before the first network call, lets interfaces come up after wake
    #[serde(rename = "startup-delay-ms")]
    pub startup_delay_ms: u64,

    /// Retry policy for the completion call
    pub retry: RetryConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            kanban_path: PathBuf::from("kanban.md"),
            output_dir: PathBuf::from("."),
            prompt_dir: PathBuf::from(".dayplanner/prompts"),
            disable_marker: PathBuf::from(".dayplanner-disabled"),
            startup_delay_ms: 30_000,
            retry: RetryConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

/// Retry configuration for the completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,

    /// Failure kinds worth another attempt
    pub on: Vec<FailureKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 60_000,
            on: vec![FailureKind::Transport],
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.backoff_ms),
            retryable: config.on.clone(),
        }
    }
}
