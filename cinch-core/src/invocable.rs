// Invocables: anything with an identity that can be called with an Invocation

use crate::Invocation;
use std::fmt;
use std::sync::Arc;

/// A callable with a stable identity.
///
/// Layers and targets share this contract, so a layer cannot tell whether
/// it wraps another layer or the target itself.
pub trait Invocable<T, E>: Send + Sync {
    /// Name used in events and diagnostics.
    fn identity(&self) -> &str;

    /// Run the call.
    fn invoke(&self, call: &Invocation) -> Result<T, E>;
}

/// Type alias for the next invocable in a layer stack
pub type SharedInvocable<T, E> = Arc<dyn Invocable<T, E>>;

impl<T, E, I> Invocable<T, E> for Arc<I>
where
    I: Invocable<T, E> + ?Sized,
{
    fn identity(&self) -> &str {
        (**self).identity()
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        (**self).invoke(call)
    }
}

/// A named function used as the innermost invocable.
pub struct Target<F> {
    name: String,
    func: F,
}

impl<F> Target<F> {
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    pub fn identity(&self) -> &str {
        &self.name
    }
}

impl<T, E, F> Invocable<T, E> for Target<F>
where
    F: Fn(&Invocation) -> Result<T, E> + Send + Sync,
{
    fn identity(&self) -> &str {
        &self.name
    }

    fn invoke(&self, call: &Invocation) -> Result<T, E> {
        (self.func)(call)
    }
}

impl<F> fmt::Debug for Target<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target").field("name", &self.name).finish()
    }
}

/// Shorthand for [`Target::new`].
pub fn target<T, E, F>(name: impl Into<String>, func: F) -> Target<F>
where
    F: Fn(&Invocation) -> Result<T, E> + Send + Sync,
{
    Target::new(name, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_target_invokes_function() {
        let double = target("double", |call: &Invocation| -> Result<i64, Error> {
            Ok(call.param::<i64>(0)? * 2)
        });

        assert_eq!(double.identity(), "double");
        assert_eq!(double.invoke(&Invocation::new().arg(21)).unwrap(), 42);
    }

    #[test]
    fn test_arc_forwards() {
        let shared: SharedInvocable<i64, Error> =
            Arc::new(target("one", |_: &Invocation| Ok::<i64, Error>(1)));

        assert_eq!(shared.identity(), "one");
        assert_eq!(shared.invoke(&Invocation::new()).unwrap(), 1);
    }
}
