// Validation traits

use crate::ValidationError;
use serde_json::Value;

/// Check applied to one argument of a call.
///
/// `param` is the display name of the argument, used in error messages.
/// Any `Fn(&Value, &str) -> Result<(), ValidationError>` is a predicate.
pub trait Predicate: Send + Sync {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError>;
}

impl<F> Predicate for F
where
    F: Fn(&Value, &str) -> Result<(), ValidationError> + Send + Sync,
{
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        self(value, param)
    }
}
