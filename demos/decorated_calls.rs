//! Decorated Calls Example
//!
//! Wraps five small functions in different layer stacks:
//! - Retry with timing around a division that can fail
//! - Retry around an unreliable network request
//! - Argument validation around factorial and Fibonacci
//! - Lifecycle logging around a greeting
//!
//! Run with:
//! ```bash
//! cargo run --example decorated_calls
//! ```

use cinch::prelude::*;
use std::time::Duration;

fn risky_division(call: &Invocation) -> Result<f64, Error> {
    let a: f64 = call.param(0)?;
    let b: f64 = call.param(1)?;
    if b == 0.0 {
        return Err(Error::failure("ValueError", "division by zero"));
    }
    Ok(a / b)
}

fn simulate_network_request(_call: &Invocation) -> Result<String, Error> {
    if fastrand::f64() < 0.7 {
        return Err(Error::failure("ConnectionError", "network error"));
    }
    Ok("data received".to_string())
}

fn calculate_factorial(call: &Invocation) -> Result<u64, Error> {
    let n: u64 = call.param(0)?;
    (1..=n)
        .try_fold(1u64, |acc, k| acc.checked_mul(k))
        .ok_or_else(|| Error::failure("OverflowError", format!("{}! does not fit in u64", n)))
}

fn fibonacci_numbers(call: &Invocation) -> Result<Vec<u64>, Error> {
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

fn main() {
    // Retry diagnostics from the core, when built with `--features tracing`
    #[cfg(feature = "tracing")]
    cinch::cinch_log::tracing_compat::install();

    println!("Cinch Decorated Calls Example");
    println!("=============================\n");

    // Retry outermost, so one timing record per attempt that succeeds
    let division = Composer::new(target("risky_division", risky_division))
        .layer(RetryLayer::new(
            RetryConfig::new(3)
                .delay(Duration::from_millis(500))
                .retry_on_kinds(["ValueError"]),
        ))
        .layer(TimingLayer::new(TimingConfig::new(TimeUnit::Milliseconds)))
        .build();

    println!("--- {} ({:?}) ---", division.identity(), division.layers());
    match division.call(&Invocation::with_args([10, 2])) {
        Ok(value) => println!("10 / 2 = {}\n", value),
        Err(e) => println!("failed: {}\n", e),
    }
    match division.call(&Invocation::with_args([10, 0])) {
        Ok(value) => println!("10 / 0 = {}\n", value),
        Err(e) => println!("10 / 0 failed after retries: {}\n", e),
    }

    let request = Composer::new(target("simulate_network_request", simulate_network_request))
        .layer(RetryLayer::new(RetryConfig::new(2).delay(Duration::from_secs(1))))
        .layer(TimingLayer::default())
        .build();

    println!("--- {} ---", request.identity());
    match request.call(&Invocation::new()) {
        Ok(data) => println!("request: {}\n", data),
        Err(e) => println!("request failed: {}\n", e),
    }

    let factorial = Composer::new(target("calculate_factorial", calculate_factorial))
        .layer(ValidationLayer::new(
            ValidationRules::new().arg(IsPositive).arg(IsPositive),
        ))
        .layer(TimingLayer::new(TimingConfig::new(TimeUnit::Milliseconds)))
        .build();

    println!("--- {} ---", factorial.identity());
    for n in [5, 25, -3] {
        match factorial.call(&Invocation::new().arg(n)) {
            Ok(value) => println!("{}! = {}\n", n, value),
            Err(e) => println!("{}! rejected: {}\n", n, e),
        }
    }

    let fibonacci = Composer::new(target("fibonacci_numbers", fibonacci_numbers))
        .layer(RetryLayer::new(
            RetryConfig::new(4).delay(Duration::from_millis(200)),
        ))
        .layer(ValidationLayer::new(
            ValidationRules::new().arg(IsInteger).arg(IsPositive),
        ))
        .build();

    println!("--- {} ---", fibonacci.identity());
    match fibonacci.call(&Invocation::new().arg(10)) {
        Ok(numbers) => println!("first 10: {:?}\n", numbers),
        Err(e) => println!("fibonacci failed: {}\n", e),
    }
    match fibonacci.call(&Invocation::new().arg(2.5)) {
        Ok(numbers) => println!("first 2.5: {:?}\n", numbers),
        Err(e) => println!("fibonacci rejected without retry: {}\n", e),
    }

    let greeter = Composer::new(target("greet", greet))
        .layer(LoggingLayer::new(LoggingConfig::new("INFO")))
        .build();

    println!("--- {} ---", greeter.identity());
    for call in [
        Invocation::new().arg("Anna"),
        Invocation::new().arg("Bob").named("greeting", "Hi"),
    ] {
        match greeter.call(&call) {
            Ok(message) => println!("{}\n", message),
            Err(e) => println!("greet failed: {}\n", e),
        }
    }
}
