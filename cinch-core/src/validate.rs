// Validation layer

use crate::{Fault, Invocable, Invocation, Layer, SharedInvocable};
use cinch_log::{Event, Phase, SharedSink, default_sink};
use cinch_validation::{ValidationError, ValidationRules};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Checks arguments before the call runs.
///
/// The first failing rule rejects the call with `E::from(ValidationError)`;
/// nothing inside the layer is invoked. Arguments the call does not supply
/// are skipped.
#[derive(Clone)]
pub struct ValidationLayer {
    rules: Arc<ValidationRules>,
    sink: SharedSink,
    level: String,
}

impl ValidationLayer {
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules: Arc::new(rules),
            sink: default_sink(),
            level: "DEBUG".to_string(),
        }
    }

    /// Sink receiving the named-argument report.
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }
}

impl fmt::Debug for ValidationLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationLayer")
            .field("rules", &self.rules)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl<T, E> Layer<T, E> for ValidationLayer
where
    T: 'static,
    E: Fault + From<ValidationError>,
{
    fn name(&self) -> &'static str {
        "validation"
    }

    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E> {
        Arc::new(Validated {
            rules: self.rules.clone(),
            sink: self.sink.clone(),
            level: self.level.clone(),
            next,
        })
    }
}

struct Validated<T, E> {
    rules: Arc<ValidationRules>,
    sink: SharedSink,
    level: String,
    next: SharedInvocable<T, E>,
}

impl<T, E> Invocable<T, E> for Validated<T, E>
where
    E: Fault + From<ValidationError>,
{
    fn identity(&self) -> &str {
        self.next.identity()
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        if !call.kwargs().is_empty() {
            let names: Vec<&str> = call.kwargs().keys().map(String::as_str).collect();
            self.sink.emit(
                &Event::new(
                    self.level.as_str(),
                    self.next.identity(),
                    Phase::Validation,
                    format!("named arguments: {}", names.join(", ")),
                )
                .with_payload(Value::Object(call.kwargs().clone())),
            );
        }

        self.rules
            .check(|param| call.get(param))
            .map_err(|error| {
                tracing::debug!(
                    target_name = %self.next.identity(),
                    param = %error.param,
                    "Rejected invalid argument"
                );
                E::from(error)
            })?;

        self.next.invoke(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Composer, Error, target};
    use cinch_log::MemorySink;
    use cinch_validation::{IsInteger, IsPositive, MaxLength};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_rejects_before_target_runs() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let add = Composer::new(target("add", move |call: &Invocation| -> Result<i64, Error> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(call.param::<i64>(0)? + call.param::<i64>(1)?)
        }))
        .layer(ValidationLayer::new(
            ValidationRules::new().arg(IsPositive).arg(IsPositive),
        ))
        .build();

        let err = add.call(&Invocation::with_args([5, -1])).unwrap_err();
        match err {
            Error::Validation(e) => assert_eq!(e.param, "argument 1"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(add.call(&Invocation::with_args([5, 1])).unwrap(), 6);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_arguments_are_skipped() {
        let fib = Composer::new(target("fibonacci", |call: &Invocation| -> Result<u64, Error> {
            Ok(call.param_or(0, 10u64)?)
        }))
        .layer(ValidationLayer::new(ValidationRules::new().arg(IsInteger)))
        .build();

        assert_eq!(fib.call(&Invocation::new()).unwrap(), 10);
        assert!(fib.call(&Invocation::new().arg(2.5)).unwrap_err().is_validation());
    }

    #[test]
    fn test_reports_named_arguments() {
        let sink = Arc::new(MemorySink::new());
        let greet = Composer::new(target("greet", |call: &Invocation| -> Result<String, Error> {
            let name: String = call.param(0)?;
            let greeting: String = call.param_or("greeting", "Hello".to_string())?;
            Ok(format!("{greeting}, {name}!"))
        }))
        .layer(
            ValidationLayer::new(ValidationRules::new().named("greeting", MaxLength(10)))
                .with_sink(sink.clone()),
        )
        .build();

        greet.call(&Invocation::new().arg("Bob")).unwrap();
        assert!(sink.is_empty());

        let result = greet
            .call(&Invocation::new().arg("Bob").named("greeting", "Hi"))
            .unwrap();
        assert_eq!(result, "Hi, Bob!");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].phase, Phase::Validation);
        assert_eq!(events[0].payload, json!({"greeting": "Hi"}));
    }
}
