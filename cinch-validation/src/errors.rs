// Validation errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Validation error for a single parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Parameter that failed validation (`argument 0`, `greeting`, ...)
    pub param: String,

    /// Error message
    pub message: String,

    /// Validation constraint that failed
    pub constraint: String,

    /// Value that failed validation (optional)
    pub value: Option<String>,
}

impl ValidationError {
    /// Kind tag shared by every validation failure.
    pub const KIND: &'static str = "ValidationError";

    /// Create a new validation error
    pub fn new(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            message: message.into(),
            constraint: "custom".to_string(),
            value: None,
        }
    }

    /// Set the constraint name
    pub fn with_constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraint = constraint.into();
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.param, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Every failure found by [`ValidationRules::validate_all`](crate::ValidationRules::validate_all),
/// in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// The failure a fail-fast check would have reported.
    pub fn first(&self) -> Option<&ValidationError> {
        self.0.first()
    }

    /// Failures for one parameter.
    pub fn for_param<'a>(&'a self, param: &'a str) -> impl Iterator<Item = &'a ValidationError> {
        self.0.iter().filter(move |e| e.param == param)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_param() {
        let error = ValidationError::new("argument 1", "argument 1 must be a positive number");
        assert_eq!(
            error.to_string(),
            "argument 1: argument 1 must be a positive number"
        );
        assert_eq!(error.constraint, "custom");
    }

    #[test]
    fn test_errors_keep_rule_order() {
        let mut errors = ValidationErrors::default();
        errors.push(ValidationError::new("argument 0", "must be positive"));
        errors.push(ValidationError::new("count", "too small").with_value("0"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.first().unwrap().param, "argument 0");
        assert_eq!(errors.for_param("count").count(), 1);
        assert_eq!(
            errors.to_string(),
            "argument 0: must be positive; count: too small"
        );

        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json[1]["value"], "0");
    }
}
