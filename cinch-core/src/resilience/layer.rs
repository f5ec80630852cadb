// Retry layer: the synchronous retry state machine inside a layer stack

use super::{AttemptRecord, RetryConfig, RetryState};
use crate::{Fault, Invocable, Invocation, Layer, SharedInvocable, SharedSleeper, ThreadSleeper};
use cinch_log::{Event, Phase, SharedSink, default_sink};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Re-invokes the next invocable until it succeeds, fails with an error
/// that must not be retried, or the attempt budget runs out.
///
/// Every attempt receives the original [`Invocation`]. On exhaustion the
/// last error is returned as is.
#[derive(Clone)]
pub struct RetryLayer {
    config: RetryConfig,
    sink: SharedSink,
    sleeper: SharedSleeper,
}

impl RetryLayer {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            sink: default_sink(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the blocking sleep between attempts.
    pub fn with_sleeper(mut self, sleeper: SharedSleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl fmt::Debug for RetryLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryLayer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, E> Layer<T, E> for RetryLayer
where
    T: 'static,
    E: Fault,
{
    fn name(&self) -> &'static str {
        "retry"
    }

    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E> {
        Arc::new(Retrying {
            config: self.config.clone(),
            sink: self.sink.clone(),
            sleeper: self.sleeper.clone(),
            next,
        })
    }
}

struct Retrying<T, E> {
    config: RetryConfig,
    sink: SharedSink,
    sleeper: SharedSleeper,
    next: SharedInvocable<T, E>,
}

impl<T, E: Fault> Retrying<T, E> {
    fn emit(&self, level: &str, phase: Phase, message: String, payload: Value) {
        self.sink.emit(
            &Event::new(level, self.next.identity(), phase, message).with_payload(payload),
        );
    }
}

impl<T, E: Fault> Invocable<T, E> for Retrying<T, E> {
    fn identity(&self) -> &str {
        self.next.identity()
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        let name = self.next.identity();
        let max_attempts = self.config.attempts();
        let mut history: Vec<AttemptRecord> = Vec::new();
        let mut attempt = 1;

        loop {
            self.emit(
                "DEBUG",
                Phase::Attempt,
                format!("attempt {}/{}", attempt, max_attempts),
                json!({ "attempt": attempt, "max_attempts": max_attempts }),
            );

            let error = match self.next.invoke(call) {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(target_name = %name, attempt, "Retry succeeded");
                        self.emit(
                            "INFO",
                            Phase::Recovered,
                            format!("{} succeeded on attempt {}", name, attempt),
                            json!({ "attempt": attempt, "failures": history.len() }),
                        );
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            let fault: &dyn Fault = &error;
            history.push(AttemptRecord::failed(attempt, fault));

            match self.config.transition(attempt, Err(fault)) {
                RetryState::Attempting(next) => {
                    let delay = self.config.delay_after(attempt);
                    debug!(
                        target_name = %name,
                        attempt,
                        delay = ?delay,
                        error = %error,
                        "Retry attempt failed, waiting before retry"
                    );
                    self.emit(
                        "WARN",
                        Phase::Retry,
                        format!(
                            "attempt {} failed: {}. Retrying in {:.3}s",
                            attempt,
                            error,
                            delay.as_secs_f64()
                        ),
                        json!({
                            "attempt": attempt,
                            "kind": error.kind(),
                            "error": error.to_string(),
                            "delay": delay.as_secs_f64(),
                        }),
                    );
                    self.sleeper.sleep(delay);
                    attempt = next;
                }
                RetryState::Exhausted => {
                    warn!(
                        target_name = %name,
                        attempt,
                        max_attempts,
                        error = %error,
                        "Final retry attempt failed"
                    );
                    self.emit(
                        "ERROR",
                        Phase::Exhausted,
                        format!("{} failed after {} attempts: {}", name, attempt, error),
                        json!({
                            "attempts": attempt,
                            "kind": error.kind(),
                            "history": serde_json::to_value(&history).unwrap_or(Value::Null),
                        }),
                    );
                    return Err(error);
                }
                RetryState::Aborted | RetryState::Succeeded => {
                    debug!(
                        target_name = %name,
                        attempt,
                        kind = error.kind(),
                        "Error is not retryable"
                    );
                    return Err(error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BackoffStrategy, Composer, Composite, Error, RecordingSleeper, target};
    use cinch_log::MemorySink;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct Fixture {
        calls: Arc<AtomicU32>,
        sink: Arc<MemorySink>,
        sleeper: Arc<RecordingSleeper>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicU32::new(0)),
                sink: Arc::new(MemorySink::new()),
                sleeper: Arc::new(RecordingSleeper::new()),
            }
        }

        /// Target that fails with `kind` on the first `failures` calls.
        fn flaky(&self, config: RetryConfig, failures: u32, kind: &'static str) -> Composite<u32, Error> {
            let calls = self.calls.clone();
            Composer::new(target("flaky", move |_: &Invocation| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures {
                    Err(Error::failure(kind, format!("failure {}", n)))
                } else {
                    Ok(n)
                }
            }))
            .layer(
                RetryLayer::new(config)
                    .with_sink(self.sink.clone())
                    .with_sleeper(self.sleeper.clone()),
            )
            .build()
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_attempt_budget_exhausted() {
        let fx = Fixture::new();
        let op = fx.flaky(RetryConfig::new(4).delay(Duration::ZERO), u32::MAX, "DivisionError");

        let err = op.call(&Invocation::new()).unwrap_err();
        assert_eq!(err, Error::failure("DivisionError", "failure 4"));
        assert_eq!(fx.calls(), 4);
        assert_eq!(fx.sink.count(Phase::Attempt), 4);
        assert_eq!(fx.sink.count(Phase::Retry), 3);
        assert_eq!(fx.sink.count(Phase::Exhausted), 1);

        let exhausted = fx.sink.events().pop().unwrap();
        assert_eq!(exhausted.payload["history"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_recovers_after_failures() {
        let fx = Fixture::new();
        let op = fx.flaky(RetryConfig::new(5), 2, "ConnectionError");

        assert_eq!(op.call(&Invocation::new()).unwrap(), 3);
        assert_eq!(fx.calls(), 3);
        assert_eq!(fx.sink.count(Phase::Recovered), 1);
        assert_eq!(fx.sleeper.delays(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn test_non_retryable_kind_fails_once() {
        let fx = Fixture::new();
        let config = RetryConfig::new(5).retry_on_kinds(["ConnectionError"]);
        let op = fx.flaky(config, u32::MAX, "ValueError");

        assert!(op.call(&Invocation::new()).is_err());
        assert_eq!(fx.calls(), 1);
        assert_eq!(fx.sink.count(Phase::Retry), 0);
        assert!(fx.sleeper.delays().is_empty());
    }

    #[test]
    fn test_validation_error_not_retried() {
        let fx = Fixture::new();
        let op = fx.flaky(RetryConfig::new(3), u32::MAX, "ValidationError");

        assert!(op.call(&Invocation::new()).unwrap_err().is_validation());
        assert_eq!(fx.calls(), 1);
    }

    #[test]
    fn test_single_attempt_budget() {
        let fx = Fixture::new();
        let op = fx.flaky(RetryConfig::new(0), u32::MAX, "IOError");

        assert!(op.call(&Invocation::new()).is_err());
        assert_eq!(fx.calls(), 1);
        assert_eq!(fx.sink.count(Phase::Exhausted), 1);
    }

    #[test]
    fn test_backoff_delays_follow_strategy() {
        let fx = Fixture::new();
        let config = RetryConfig::new(4)
            .backoff(BackoffStrategy::exponential(Duration::from_millis(100)));
        let op = fx.flaky(config, 3, "TimeoutError");

        assert_eq!(op.call(&Invocation::new()).unwrap(), 4);
        assert_eq!(
            fx.sleeper.delays(),
            vec![
                Duration::from_millis(100),
                Duration::from_millis(200),
                Duration::from_millis(400)
            ]
        );
    }
}
