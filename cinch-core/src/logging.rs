// Logging layer: lifecycle events around a call

use crate::{Fault, Invocable, Invocation, Layer, SharedInvocable};
use cinch_log::{Event, Phase, SharedSink, default_sink};
use serde_json::json;
use std::fmt;
use std::sync::Arc;

/// Configuration for [`LoggingLayer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Level label attached to start, args and success events.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
        }
    }
}

/// Emits `start`, `args`, `success` and `failure` events.
///
/// Failures are always reported at `ERROR`, whatever the configured label,
/// and the error is returned unchanged.
#[derive(Clone)]
pub struct LoggingLayer {
    config: LoggingConfig,
    sink: SharedSink,
}

impl LoggingLayer {
    pub fn new(config: LoggingConfig) -> Self {
        Self {
            config,
            sink: default_sink(),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self::new(LoggingConfig::default())
    }
}

impl fmt::Debug for LoggingLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingLayer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T, E> Layer<T, E> for LoggingLayer
where
    T: fmt::Debug + 'static,
    E: Fault,
{
    fn name(&self) -> &'static str {
        "logging"
    }

    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E> {
        Arc::new(Logged {
            level: self.config.level.clone(),
            sink: self.sink.clone(),
            next,
        })
    }
}

struct Logged<T, E> {
    level: String,
    sink: SharedSink,
    next: SharedInvocable<T, E>,
}

impl<T, E> Invocable<T, E> for Logged<T, E>
where
    T: fmt::Debug,
    E: Fault,
{
    fn identity(&self) -> &str {
        self.next.identity()
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        let name = self.next.identity();

        self.sink.emit(&Event::new(
            self.level.as_str(),
            name,
            Phase::Start,
            format!("calling {}", name),
        ));

        if !call.is_empty() {
            self.sink.emit(
                &Event::new(self.level.as_str(), name, Phase::Args, "arguments")
                    .with_payload(call.to_payload()),
            );
        }

        match self.next.invoke(call) {
            Ok(value) => {
                self.sink.emit(
                    &Event::new(
                        self.level.as_str(),
                        name,
                        Phase::Success,
                        format!("{} returned", name),
                    )
                    .with_payload(json!({ "result": format!("{:?}", value) })),
                );
                Ok(value)
            }
            Err(error) => {
                self.sink.emit(
                    &Event::new("ERROR", name, Phase::Failure, format!("{} failed: {}", name, error))
                        .with_payload(json!({
                            "kind": error.kind(),
                            "error": error.to_string(),
                        })),
                );
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Composer, Error, target};
    use cinch_log::MemorySink;

    fn logged<F>(sink: Arc<MemorySink>, level: &str, f: F) -> crate::Composite<String, Error>
    where
        F: Fn(&Invocation) -> Result<String, Error> + Send + Sync + 'static,
    {
        Composer::new(target("greet", f))
            .layer(LoggingLayer::new(LoggingConfig::new(level)).with_sink(sink))
            .build()
    }

    #[test]
    fn test_success_events() {
        let sink = Arc::new(MemorySink::new());
        let greet = logged(sink.clone(), "DEBUG", |call| {
            let name: String = call.param(0)?;
            Ok(format!("Hello, {}!", name))
        });

        let result = greet.call(&Invocation::new().arg("Alice")).unwrap();
        assert_eq!(result, "Hello, Alice!");

        let events = sink.events();
        assert_eq!(
            sink.phases(),
            vec![Phase::Start, Phase::Args, Phase::Success]
        );
        assert!(events.iter().all(|e| e.level == "DEBUG"));
        assert!(events.iter().all(|e| e.target == "greet"));
        assert_eq!(events[1].payload, json!({"args": ["Alice"]}));
        assert_eq!(events[2].payload, json!({"result": "\"Hello, Alice!\""}));
    }

    #[test]
    fn test_no_args_event_without_arguments() {
        let sink = Arc::new(MemorySink::new());
        let greet = logged(sink.clone(), "INFO", |_| Ok("Hello".to_string()));

        greet.call(&Invocation::new()).unwrap();
        assert_eq!(sink.phases(), vec![Phase::Start, Phase::Success]);
    }

    #[test]
    fn test_failure_is_error_level_and_unchanged() {
        let sink = Arc::new(MemorySink::new());
        let greet = logged(sink.clone(), "DEBUG", |_| {
            Err(Error::failure("ConnectionError", "network unreachable"))
        });

        let err = greet.call(&Invocation::new().named("retries", 0)).unwrap_err();
        assert_eq!(err, Error::failure("ConnectionError", "network unreachable"));

        let events = sink.events();
        let failure = events.last().unwrap();
        assert_eq!(failure.phase, Phase::Failure);
        assert_eq!(failure.level, "ERROR");
        assert_eq!(failure.payload["kind"], "ConnectionError");
        assert_eq!(sink.count(Phase::Success), 0);
    }
}
