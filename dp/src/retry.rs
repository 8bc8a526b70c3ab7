//! Retry policy and generic retry wrapper
//!
//! A policy names how many attempts to make, how long to wait between them,
//! and which failure kinds are worth another attempt. Anything else is
//! returned to the caller on first sight.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Coarse failure classes used for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Connect, timeout, send failures
    Transport,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    Server,
    /// HTTP 4xx, bad configuration
    Client,
    /// Response body could not be understood
    Decode,
}

/// Errors that can tell which failure class they belong to
pub trait Classify {
    fn failure_kind(&self) -> FailureKind;
}

/// How to retry a fallible operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub backoff: Duration,
    /// Failure kinds that trigger another attempt
    pub retryable: Vec<FailureKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(60),
            retryable: vec![FailureKind::Transport],
        }
    }
}

impl RetryPolicy {
    pub fn should_retry(&self, kind: FailureKind) -> bool {
        self.retryable.contains(&kind)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy runs out of attempts
///
/// `op` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        debug!(%what, attempt, attempts, "retry: attempting");
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let kind = e.failure_kind();
                if attempt >= attempts || !policy.should_retry(kind) {
                    debug!(%what, attempt, ?kind, "retry: giving up");
                    return Err(e);
                }
                warn!(
                    "{} failed (attempt {}/{}, {:?}): {}; retrying in {:?}",
                    what, attempt, attempts, kind, e, policy.backoff
                );
                tokio::time::sleep(policy.backoff).await;
                attempt += 1;
            }
        }
    }
}
