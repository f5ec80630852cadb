// Composition of layers around a target

use crate::{Invocable, Invocation, SharedInvocable};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Factory that wraps "the next invocable" in cross-cutting behavior.
///
/// The returned invocable must keep the call contract of `next`: same
/// identity, same arguments, and the same value or error unless the layer
/// documents otherwise.
pub trait Layer<T, E>: Send + Sync {
    /// Short name used in diagnostics (`"retry"`, `"timing"`, ...).
    fn name(&self) -> &'static str;

    /// Wrap `next`.
    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E>;
}

/// Type alias for a layer stored in a stack
pub type SharedLayer<T, E> = Arc<dyn Layer<T, E>>;

impl<T, E, L> Layer<T, E> for Arc<L>
where
    L: Layer<T, E> + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn wrap(&self, next: SharedInvocable<T, E>) -> SharedInvocable<T, E> {
        (**self).wrap(next)
    }
}

/// A target wrapped in an ordered stack of layers.
///
/// Immutable once built; cloning shares the stack.
pub struct Composite<T, E> {
    identity: String,
    layers: Vec<&'static str>,
    outer: SharedInvocable<T, E>,
}

impl<T, E> Composite<T, E> {
    /// Identity of the wrapped target.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Layer names, outermost first.
    pub fn layers(&self) -> &[&'static str] {
        &self.layers
    }

    /// Call the outermost layer.
    pub fn call(&self, call: &Invocation) -> Result<T, E> {
        trace!(target_name = %self.identity, "Invoking composite");
        self.outer.invoke(call)
    }
}

impl<T, E> Clone for Composite<T, E> {
    fn clone(&self) -> Self {
        Self {
            identity: self.identity.clone(),
            layers: self.layers.clone(),
            outer: self.outer.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Composite<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composite")
            .field("identity", &self.identity)
            .field("layers", &self.layers)
            .finish()
    }
}

impl<T, E> Invocable<T, E> for Composite<T, E> {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        self.call(call)
    }
}

/// Wrap `target` in `layers`. The first layer becomes the outermost one.
pub fn compose<T, E, I>(target: I, layers: Vec<SharedLayer<T, E>>) -> Composite<T, E>
where
    I: Invocable<T, E> + 'static,
    T: 'static,
    E: 'static,
{
    assemble(Arc::new(target), layers)
}

fn assemble<T, E>(target: SharedInvocable<T, E>, layers: Vec<SharedLayer<T, E>>) -> Composite<T, E> {
    let identity = target.identity().to_string();
    let names: Vec<&'static str> = layers.iter().map(|layer| layer.name()).collect();

    // Wrap innermost first so the first layer ends up outside.
    let outer = layers
        .iter()
        .rev()
        .fold(target, |next, layer| layer.wrap(next));

    debug!(target_name = %identity, layers = ?names, "Composed invocable");

    Composite {
        identity,
        layers: names,
        outer,
    }
}

/// Builder mirroring [`compose`]: layers added first run first.
///
/// ```rust
/// use cinch_core::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let sink = Arc::new(MemorySink::new());
/// let divide = Composer::new(target("divide", |call: &Invocation| -> Result<f64> {
///     let (a, b): (f64, f64) = (call.param(0)?, call.param(1)?);
///     if b == 0.0 {
///         return Err(Error::failure("ZeroDivisionError", "division by zero"));
///     }
///     Ok(a / b)
/// }))
/// .layer(LoggingLayer::new(LoggingConfig::default()).with_sink(sink.clone()))
/// .layer(RetryLayer::new(RetryConfig::new(3).delay(Duration::ZERO)).with_sink(sink.clone()))
/// .build();
///
/// assert_eq!(divide.identity(), "divide");
/// assert_eq!(divide.layers(), &["logging", "retry"]);
/// assert_eq!(divide.call(&Invocation::with_args([10, 2])).unwrap(), 5.0);
/// assert!(divide.call(&Invocation::with_args([10, 0])).is_err());
/// ```
pub struct Composer<T, E> {
    target: SharedInvocable<T, E>,
    layers: Vec<SharedLayer<T, E>>,
}

impl<T: 'static, E: 'static> Composer<T, E> {
    pub fn new<I: Invocable<T, E> + 'static>(target: I) -> Self {
        Self {
            target: Arc::new(target),
            layers: Vec::new(),
        }
    }

    /// Add a layer inside the ones added so far.
    pub fn layer<L: Layer<T, E> + 'static>(mut self, layer: L) -> Self {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Add an already shared layer.
    pub fn shared_layer(mut self, layer: SharedLayer<T, E>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> Composite<T, E> {
        assemble(self.target, self.layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, target};
    use parking_lot::Mutex;

    /// Records entry and exit around the next invocable.
    struct Trace {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    struct Traced {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        next: SharedInvocable<i64, Error>,
    }

    impl Layer<i64, Error> for Trace {
        fn name(&self) -> &'static str {
            self.label
        }

        fn wrap(&self, next: SharedInvocable<i64, Error>) -> SharedInvocable<i64, Error> {
            Arc::new(Traced {
                label: self.label,
                log: self.log.clone(),
                next,
            })
        }
    }

    impl Invocable<i64, Error> for Traced {
        fn identity(&self) -> &str {
            self.next.identity()
        }

        fn invoke(&self, call: &Invocation) -> Result<i64, Error> {
            self.log.lock().push(format!("enter {}", self.label));
            let result = self.next.invoke(call);
            self.log.lock().push(format!("exit {}", self.label));
            result
        }
    }

    /// Rejects every call without delegating.
    struct Deny;

    impl Layer<i64, Error> for Deny {
        fn name(&self) -> &'static str {
            "deny"
        }

        fn wrap(&self, next: SharedInvocable<i64, Error>) -> SharedInvocable<i64, Error> {
            struct Denied(SharedInvocable<i64, Error>);

            impl Invocable<i64, Error> for Denied {
                fn identity(&self) -> &str {
                    self.0.identity()
                }

                fn invoke(&self, _call: &Invocation) -> Result<i64, Error> {
                    Err(Error::failure("PermissionError", "denied"))
                }
            }

            Arc::new(Denied(next))
        }
    }

    fn answer(log: Arc<Mutex<Vec<String>>>) -> impl Invocable<i64, Error> {
        target("answer", move |_: &Invocation| {
            log.lock().push("target".to_string());
            Ok::<i64, Error>(42)
        })
    }

    #[test]
    fn test_first_layer_is_outermost() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let layers: Vec<SharedLayer<i64, Error>> = vec![
            Arc::new(Trace { label: "a", log: log.clone() }),
            Arc::new(Trace { label: "b", log: log.clone() }),
        ];

        let composite = compose(answer(log.clone()), layers);
        assert_eq!(composite.call(&Invocation::new()).unwrap(), 42);

        assert_eq!(
            *log.lock(),
            vec!["enter a", "enter b", "target", "exit b", "exit a"]
        );
        assert_eq!(composite.layers(), &["a", "b"]);
    }

    #[test]
    fn test_layer_can_short_circuit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = Composer::new(answer(log.clone()))
            .layer(Trace { label: "outer", log: log.clone() })
            .layer(Deny)
            .build();

        let err = composite.call(&Invocation::new()).unwrap_err();
        assert_eq!(err, Error::failure("PermissionError", "denied"));
        assert_eq!(*log.lock(), vec!["enter outer", "exit outer"]);
    }

    #[test]
    fn test_identity_survives_nesting() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let inner = Composer::new(answer(log.clone()))
            .layer(Trace { label: "x", log: log.clone() })
            .build();
        let outer = Composer::new(inner)
            .layer(Trace { label: "y", log: log.clone() })
            .layer(Trace { label: "z", log })
            .build();

        assert_eq!(outer.identity(), "answer");
        assert_eq!(Invocable::identity(&outer), "answer");
    }

    #[test]
    fn test_no_layers_calls_target() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let composite = compose(answer(log.clone()), Vec::new());

        assert_eq!(composite.call(&Invocation::new()).unwrap(), 42);
        assert!(composite.layers().is_empty());
        assert_eq!(*log.lock(), vec!["target"]);
    }
}
