//! Integration tests for common Cinch workflows.
//!
//! Each test wraps one of the classic decorated functions (division,
//! network request, factorial, Fibonacci, greeting) and checks what the
//! caller observes.

use cinch::prelude::*;
use cinch::{NoopSleeper, RecordingSleeper, SharedSink};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

// =============================================================================
// Fixtures
// =============================================================================

fn divide(call: &Invocation) -> Result<f64, Error> {
    let a: f64 = call.param(0)?;
    let b: f64 = call.param(1)?;
    if b == 0.0 {
        return Err(Error::failure("ValueError", "division by zero"));
    }
    Ok(a / b)
}

fn factorial(call: &Invocation) -> Result<u64, Error> {
    let n: u64 = call.param(0)?;
    (1..=n)
        .try_fold(1u64, |acc, k| acc.checked_mul(k))
        .ok_or_else(|| Error::failure("OverflowError", format!("{}! does not fit in u64", n)))
}

fn fibonacci(call: &Invocation) -> Result<Vec<u64>, Error> {
    let count: usize = call.param(0)?;
    let mut numbers = Vec::with_capacity(count);
    let (mut a, mut b) = (0u64, 1u64);
    for _ in 0..count {
        numbers.push(a);
        (a, b) = (b, a.saturating_add(b));
    }
    Ok(numbers)
}

fn greet(call: &Invocation) -> Result<String, Error> {
    let name: String = call.param(0)?;
    let greeting: String = call.param_or("greeting", "Hello".to_string())?;
    Ok(format!("{}, {}!", greeting, name))
}

struct Harness {
    sink: Arc<MemorySink>,
    sleeper: Arc<RecordingSleeper>,
}

impl Harness {
    fn new() -> Self {
        Self {
            sink: Arc::new(MemorySink::new()),
            sleeper: Arc::new(RecordingSleeper::new()),
        }
    }

    fn shared_sink(&self) -> SharedSink {
        self.sink.clone()
    }

    fn retry(&self, config: RetryConfig) -> RetryLayer {
        RetryLayer::new(config)
            .with_sink(self.shared_sink())
            .with_sleeper(self.sleeper.clone())
    }

    fn timing(&self, unit: TimeUnit) -> TimingLayer {
        TimingLayer::new(TimingConfig::new(unit)).with_sink(self.shared_sink())
    }

    fn logging(&self, level: &str) -> LoggingLayer {
        LoggingLayer::new(LoggingConfig::new(level)).with_sink(self.shared_sink())
    }
}

// =============================================================================
// Retry
// =============================================================================

#[test]
fn test_division_by_zero_is_retried_then_raised() {
    let h = Harness::new();
    let risky_division = Composer::new(target("risky_division", divide))
        .layer(
            h.retry(
                RetryConfig::new(3)
                    .delay(Duration::from_millis(500))
                    .retry_on_kinds(["ValueError"]),
            ),
        )
        .layer(h.timing(TimeUnit::Milliseconds))
        .build();

    let err = risky_division
        .call(&Invocation::with_args([10, 0]))
        .unwrap_err();

    assert_eq!(err, Error::failure("ValueError", "division by zero"));
    assert_eq!(h.sink.count(Phase::Retry), 2);
    assert_eq!(h.sink.count(Phase::Exhausted), 1);
    assert_eq!(h.sink.count(Phase::Timing), 0);
    assert_eq!(h.sleeper.total(), Duration::from_secs(1));
}

#[test]
fn test_division_success() {
    let h = Harness::new();
    let risky_division = Composer::new(target("risky_division", divide))
        .layer(h.retry(RetryConfig::new(3).retry_on_kinds(["ValueError"])))
        .layer(h.timing(TimeUnit::Milliseconds))
        .build();

    assert_eq!(risky_division.call(&Invocation::with_args([10, 2])).unwrap(), 5.0);
    assert_eq!(h.sink.count(Phase::Timing), 1);
    assert!(h.sleeper.delays().is_empty());
}

#[test]
fn test_flaky_network_request_recovers() {
    let h = Harness::new();
    let failures = Arc::new(AtomicU32::new(0));
    let counter = failures.clone();

    let request = Composer::new(target("simulate_network_request", move |_: &Invocation| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::failure("ConnectionError", "network error"));
        }
        Ok("data received".to_string())
    }))
    .layer(h.retry(RetryConfig::new(2).delay(Duration::from_secs(1))))
    .layer(h.timing(TimeUnit::Seconds))
    .build();

    assert_eq!(request.call(&Invocation::new()).unwrap(), "data received");
    assert_eq!(failures.load(Ordering::SeqCst), 2);
    assert_eq!(h.sink.count(Phase::Recovered), 1);
    assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(1)]);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_factorial_validated() {
    let h = Harness::new();
    let calculate_factorial = Composer::new(target("calculate_factorial", factorial))
        .layer(ValidationLayer::new(
            ValidationRules::new().arg(IsPositive).arg(IsPositive),
        ))
        .layer(h.timing(TimeUnit::Milliseconds))
        .build();

    assert_eq!(calculate_factorial.call(&Invocation::new().arg(5)).unwrap(), 120);
    assert!(h.sink.events()[0].message.ends_with(" ms"));

    let err = calculate_factorial
        .call(&Invocation::new().arg(-3))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.sink.count(Phase::Timing), 1);
}

#[test]
fn test_factorial_overflow_is_a_failure() {
    let calculate_factorial = Composer::new(target("calculate_factorial", factorial))
        .layer(ValidationLayer::new(ValidationRules::new().arg(IsPositive)))
        .build();

    assert_eq!(
        calculate_factorial.call(&Invocation::new().arg(20)).unwrap(),
        2_432_902_008_176_640_000
    );

    let err = calculate_factorial
        .call(&Invocation::new().arg(21))
        .unwrap_err();
    assert_eq!(err.kind(), "OverflowError");
    assert!(!err.is_validation());
}

#[test]
fn test_fibonacci_validation_not_retried() {
    let h = Harness::new();
    let fibonacci_numbers = Composer::new(target("fibonacci_numbers", fibonacci))
        .layer(h.retry(RetryConfig::new(4).delay(Duration::from_millis(200))))
        .layer(ValidationLayer::new(
            ValidationRules::new().arg(IsInteger).arg(IsPositive),
        ))
        .build();

    assert_eq!(
        fibonacci_numbers.call(&Invocation::new().arg(8)).unwrap(),
        vec![0, 1, 1, 2, 3, 5, 8, 13]
    );

    let err = fibonacci_numbers
        .call(&Invocation::new().arg(2.5))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(h.sink.count(Phase::Attempt), 2);
    assert!(h.sleeper.delays().is_empty());
}

// =============================================================================
// Logging
// =============================================================================

#[test]
fn test_greet_logged_with_named_argument() {
    let h = Harness::new();
    let greeter = Composer::new(target("greet", greet))
        .layer(h.logging("INFO"))
        .build();

    let result = greeter
        .call(&Invocation::new().arg("Anna").named("greeting", "Hi"))
        .unwrap();
    assert_eq!(result, "Hi, Anna!");

    let events = h.sink.events();
    assert_eq!(
        h.sink.phases(),
        vec![Phase::Start, Phase::Args, Phase::Success]
    );
    assert_eq!(
        events[1].payload,
        json!({"args": ["Anna"], "kwargs": {"greeting": "Hi"}})
    );
    assert_eq!(events[2].payload["result"], json!("\"Hi, Anna!\""));
}

#[test]
fn test_greet_default_greeting() {
    let greeter = Composer::new(target("greet", greet))
        .layer(LoggingLayer::default().with_sink(Arc::new(MemorySink::new())))
        .layer(RetryLayer::default().with_sleeper(Arc::new(NoopSleeper)).with_sink(Arc::new(MemorySink::new())))
        .build();

    assert_eq!(greeter.call(&Invocation::new().arg("World")).unwrap(), "Hello, World!");
    assert_eq!(greeter.identity(), "greet");
}

#[test]
fn test_missing_argument_is_validation_error() {
    let h = Harness::new();
    let greeter = Composer::new(target("greet", greet))
        .layer(h.logging("DEBUG"))
        .build();

    let err = greeter.call(&Invocation::new()).unwrap_err();
    assert!(err.is_validation());

    let failure = h.sink.events().pop().unwrap();
    assert_eq!(failure.phase, Phase::Failure);
    assert_eq!(failure.level, "ERROR");
    assert_eq!(failure.payload["kind"], json!("ValidationError"));
}
