//! Configured Layers Example
//!
//! Builds the retry, timing and logging layers from `CINCH_*` environment
//! variables (or an optional settings file given as the first argument).
//!
//! Run with:
//! ```bash
//! CINCH_MAX_ATTEMPTS=4 CINCH_DELAY=0.1 CINCH_BACKOFF=exponential \
//!     cargo run --example configured_layers --features config
//! ```

use cinch::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(path)?,
        None => Settings::from_env()?,
    };

    println!("Cinch Configured Layers Example");
    println!("===============================\n");
    println!("{:#?}\n", settings);

    let sink = settings.sink()?;
    let retry = settings.retry_config()?;
    let budget = retry.attempts();

    // Fails on every attempt but the last one the budget allows
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let fetch = Composer::new(target("fetch_report", move |call: &Invocation| -> Result<String, Error> {
        let id: u64 = call.param(0)?;
        if counter.fetch_add(1, Ordering::SeqCst) + 1 < budget {
            return Err(Error::failure("ConnectionError", "connection reset"));
        }
        Ok(format!("report #{}", id))
    }))
    .layer(LoggingLayer::new(settings.logging_config()).with_sink(sink.clone()))
    .layer(RetryLayer::new(retry).with_sink(sink.clone()))
    .layer(TimingLayer::new(settings.timing_config()?).with_sink(sink.clone()))
    .layer(ValidationLayer::new(ValidationRules::new().arg(IsPositive)).with_sink(sink))
    .build();

    match fetch.call(&Invocation::new().arg(7)) {
        Ok(report) => println!("\n{} after {} call(s)", report, calls.load(Ordering::SeqCst)),
        Err(e) => println!("\nfetch failed: {}", e),
    }

    Ok(())
}
