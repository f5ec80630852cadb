// Timing layer

use crate::{Clock, Invocable, Invocation, Layer, SharedClock, SharedInvocable, SystemClock};
use cinch_log::{Event, Phase, SharedSink, default_sink};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Unit used when reporting elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    /// Parse a unit name (`"seconds"`, `"s"`, `"milliseconds"`, `"ms"`).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => Some(TimeUnit::Seconds),
            "milliseconds" | "millisecond" | "millis" | "ms" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Milliseconds => "milliseconds",
        }
    }

    /// Elapsed time as a number in this unit.
    pub fn convert(&self, elapsed: Duration) -> f64 {
        match self {
            TimeUnit::Seconds => elapsed.as_secs_f64(),
            TimeUnit::Milliseconds => elapsed.as_secs_f64() * 1000.0,
        }
    }

    /// `0.001234 s` or `1.23 ms`.
    pub fn format(&self, elapsed: Duration) -> String {
        match self {
            TimeUnit::Seconds => format!("{:.6} s", self.convert(elapsed)),
            TimeUnit::Milliseconds => format!("{:.2} ms", self.convert(elapsed)),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for [`TimingLayer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingConfig {
    pub unit: TimeUnit,
    /// Level label of the timing event.
    pub level: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            unit: TimeUnit::Seconds,
            level: "INFO".to_string(),
        }
    }
}

impl TimingConfig {
    pub fn new(unit: TimeUnit) -> Self {
        Self {
            unit,
            ..Default::default()
        }
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }
}

/// Reports the duration of successful calls.
///
/// Errors pass through without an event.
#[derive(Clone)]
pub struct TimingLayer {
    config: TimingConfig,
    sink: SharedSink,
    clock: SharedClock,
}

impl TimingLayer {
    pub fn new(config: TimingConfig) -> Self {
        Self {
            config,
            sink: default_sink(),
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for TimingLayer {
    fn default() -> Self {
        Self::new(TimingConfig::default())
    }
}

impl fmt::Debug for TimingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimingLayer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: 'static, E: 'static> Layer<T, E> for TimingLayer {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E> {
        Arc::new(Timed {
            config: self.config.clone(),
            sink: self.sink.clone(),
            clock: self.clock.clone(),
            next,
        })
    }
}

struct Timed<T, E> {
    config: TimingConfig,
    sink: SharedSink,
    clock: SharedClock,
    next: SharedInvocable<T, E>,
}

impl<T, E> Invocable<T, E> for Timed<T, E> {
    fn identity(&self) -> &str {
        self.next.identity()
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        let start = self.clock.now();
        let value = self.next.invoke(call)?;
        let elapsed = self.clock.now().saturating_sub(start);

        let name = self.next.identity();
        let unit = self.config.unit;
        self.sink.emit(
            &Event::new(
                self.config.level.as_str(),
                name,
                Phase::Timing,
                format!("{} took {}", name, unit.format(elapsed)),
            )
            .with_payload(json!({
                "elapsed": unit.convert(elapsed),
                "unit": unit.as_str(),
            })),
        );

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Composer, Error, ManualClock, target};
    use cinch_log::MemorySink;

    #[test]
    fn test_unit_formatting() {
        let elapsed = Duration::from_micros(1234);
        assert_eq!(TimeUnit::Seconds.format(elapsed), "0.001234 s");
        assert_eq!(TimeUnit::Milliseconds.format(elapsed), "1.23 ms");
    }

    #[test]
    fn test_unit_from_str() {
        assert_eq!(TimeUnit::from_str("ms"), Some(TimeUnit::Milliseconds));
        assert_eq!(TimeUnit::from_str("Seconds"), Some(TimeUnit::Seconds));
        assert_eq!(TimeUnit::from_str("hours"), None);
    }

    #[test]
    fn test_reports_elapsed_on_success() {
        let sink = Arc::new(MemorySink::new());
        let clock = Arc::new(ManualClock::new());

        let ticking = clock.clone();
        let slow = Composer::new(target("slow", move |_: &Invocation| {
            ticking.advance(Duration::from_millis(250));
            Ok::<u32, Error>(7)
        }))
        .layer(
            TimingLayer::new(TimingConfig::new(TimeUnit::Milliseconds))
                .with_sink(sink.clone())
                .with_clock(clock),
        )
        .build();

        assert_eq!(slow.call(&Invocation::new()).unwrap(), 7);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, Phase::Timing);
        assert_eq!(events[0].message, "slow took 250.00 ms");
        assert_eq!(events[0].payload["unit"], "milliseconds");
    }

    #[test]
    fn test_failure_has_no_timing_event() {
        let sink = Arc::new(MemorySink::new());
        let broken = Composer::new(target("broken", |_: &Invocation| {
            Err::<u32, Error>(Error::failure("ValueError", "bad input"))
        }))
        .layer(TimingLayer::default().with_sink(sink.clone()))
        .build();

        let err = broken.call(&Invocation::new()).unwrap_err();
        assert_eq!(err, Error::failure("ValueError", "bad input"));
        assert!(sink.is_empty());
    }
}
