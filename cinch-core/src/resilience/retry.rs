//! Retry policy, state machine and the async retry executor.
//!
//! ## Example
//!
//! ```rust
//! use cinch_core::{BackoffStrategy, Error, Retry, RetryConfig};
//! use std::time::Duration;
//!
//! let retry = Retry::new(
//!     RetryConfig::new(3)
//!         .backoff(BackoffStrategy::exponential(Duration::from_millis(1)))
//!         .retry_on_kinds(["ConnectionError"]),
//! );
//!
//! let result = tokio_test::block_on(retry.call(|| async {
//!     Ok::<_, Error>("data")
//! }));
//! assert_eq!(result.unwrap(), "data");
//! ```

use super::BackoffStrategy;
use crate::Fault;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Type alias for a retry error predicate function.
pub type RetryErrorPredicate = Arc<dyn Fn(&dyn Fault) -> bool + Send + Sync>;

/// Configuration for which errors are retryable.
///
/// Validation errors are never retryable, whatever the variant.
#[derive(Clone, Default)]
pub enum RetryableErrors {
    /// Retry all errors.
    #[default]
    All,
    /// Never retry (fail immediately).
    None,
    /// Retry errors whose kind is in the set.
    Kinds(BTreeSet<String>),
    /// Use custom predicate.
    Custom(RetryErrorPredicate),
}

impl RetryableErrors {
    pub fn kinds<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Kinds(kinds.into_iter().map(Into::into).collect())
    }

    /// Whether `error` may be retried.
    pub fn allows(&self, error: &dyn Fault) -> bool {
        if error.is_validation() {
            return false;
        }
        match self {
            Self::All => true,
            Self::None => false,
            Self::Kinds(kinds) => kinds.contains(error.kind()),
            Self::Custom(predicate) => predicate(error),
        }
    }
}

impl fmt::Debug for RetryableErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::None => write!(f, "None"),
            Self::Kinds(kinds) => f.debug_tuple("Kinds").field(kinds).finish(),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including initial).
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Which errors are retryable.
    pub retryable_errors: RetryableErrors,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::default(),
            retryable_errors: RetryableErrors::All,
        }
    }
}

impl RetryConfig {
    /// Create new retry configuration. A budget of 0 is raised to 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Use a constant delay between attempts.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.backoff = BackoffStrategy::Constant(delay);
        self
    }

    /// Set the backoff strategy.
    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set retryable errors.
    pub fn retryable(mut self, retryable: RetryableErrors) -> Self {
        self.retryable_errors = retryable;
        self
    }

    /// Only retry errors of the given kinds.
    pub fn retry_on_kinds<I, S>(self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.retryable(RetryableErrors::kinds(kinds))
    }

    /// Only retry errors accepted by `predicate`.
    pub fn retry_on<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&dyn Fault) -> bool + Send + Sync + 'static,
    {
        self.retryable_errors = RetryableErrors::Custom(Arc::new(predicate));
        self
    }

    /// Effective attempt budget, never below 1.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay_for_attempt(attempt.saturating_sub(1))
    }

    /// Next state after attempt `attempt` (1-based) finished with `outcome`.
    pub fn transition(&self, attempt: u32, outcome: Result<(), &dyn Fault>) -> RetryState {
        match outcome {
            Ok(()) => RetryState::Succeeded,
            Err(error) if !self.retryable_errors.allows(error) => RetryState::Aborted,
            Err(_) if attempt < self.attempts() => RetryState::Attempting(attempt + 1),
            Err(_) => RetryState::Exhausted,
        }
    }
}

/// States of one retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Attempt `n` (1-based) is about to run.
    Attempting(u32),
    Succeeded,
    /// Every attempt failed with a retryable error.
    Exhausted,
    /// An attempt failed with an error that must not be retried.
    Aborted,
}

impl RetryState {
    /// Whether the call is finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetryState::Attempting(_))
    }
}

/// One failed attempt, kept for the exhaustion report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn failed(attempt: u32, error: &dyn Fault) -> Self {
        Self {
            attempt,
            error: Some(error.to_string()),
            at: Utc::now(),
        }
    }
}

/// Retry executor for async operations.
///
/// Shares [`RetryConfig`] and its retryable-error decision with
/// [`RetryLayer`](super::RetryLayer); waits with `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct Retry {
    config: RetryConfig,
}

impl Retry {
    /// Create a new retry executor.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration.
    pub fn default_retry() -> Self {
        Self::new(RetryConfig::default())
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute with retry logic. The last error is returned unchanged.
    pub async fn call<F, Fut, T, E>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Fault,
    {
        let mut attempt = 1;

        loop {
            let error = match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(attempt, "Retry succeeded");
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            let fault: &dyn Fault = &error;
            match self.config.transition(attempt, Err(fault)) {
                RetryState::Attempting(next) => {
                    let delay = self.config.delay_after(attempt);
                    debug!(
                        attempt,
                        delay = ?delay,
                        error = %error,
                        "Retry attempt failed, waiting before retry"
                    );

                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt = next;
                }
                RetryState::Exhausted => {
                    warn!(
                        attempt,
                        max_attempts = self.config.attempts(),
                        error = %error,
                        "Final retry attempt failed"
                    );
                    return Err(error);
                }
                RetryState::Aborted | RetryState::Succeeded => {
                    debug!(attempt, kind = error.kind(), "Error is not retryable");
                    return Err(error);
                }
            }
        }
    }

    /// Execute with a custom retry predicate instead of the configured one.
    pub async fn call_if<F, Fut, T, E, P>(&self, mut f: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.config.attempts();
        let mut attempt = 1;

        loop {
            match f().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !should_retry(&e) || attempt >= max_attempts {
                        return Err(e);
                    }

                    let delay = self.config.delay_after(attempt);
                    debug!(attempt, delay = ?delay, error = %e, "Retrying");
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
