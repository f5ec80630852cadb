// Built-in argument predicates

use crate::{Predicate, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static ALPHANUMERIC_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").ok());

/// Short rendering of a value for error reports.
fn shown(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn number(value: &Value, param: &str, constraint: &str) -> Result<f64, ValidationError> {
    value.as_f64().ok_or_else(|| {
        ValidationError::new(param, format!("{} must be a number", param))
            .with_constraint(constraint)
            .with_value(shown(value))
    })
}

fn text<'a>(value: &'a Value, param: &str, constraint: &str) -> Result<&'a str, ValidationError> {
    value.as_str().ok_or_else(|| {
        ValidationError::new(param, format!("{} must be a string", param))
            .with_constraint(constraint)
            .with_value(shown(value))
    })
}

// Numeric predicates

/// Validates that a number is strictly greater than zero
#[derive(Debug, Clone, Copy, Default)]
pub struct IsPositive;

impl Predicate for IsPositive {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if number(value, param, "isPositive")? > 0.0 {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} must be a positive number", param))
                    .with_constraint("isPositive")
                    .with_value(shown(value)),
            )
        }
    }
}

/// Validates that a number is zero or greater
#[derive(Debug, Clone, Copy, Default)]
pub struct IsNonNegative;

impl Predicate for IsNonNegative {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if number(value, param, "isNonNegative")? >= 0.0 {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} must not be negative", param))
                    .with_constraint("isNonNegative")
                    .with_value(shown(value)),
            )
        }
    }
}

/// Validates that a value is an integer (floats such as `5.0` are rejected)
#[derive(Debug, Clone, Copy, Default)]
pub struct IsInteger;

impl Predicate for IsInteger {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if value.is_i64() || value.is_u64() {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} must be an integer", param))
                    .with_constraint("isInteger")
                    .with_value(shown(value)),
            )
        }
    }
}

/// Validates that a value is any number
#[derive(Debug, Clone, Copy, Default)]
pub struct IsNumber;

impl Predicate for IsNumber {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        number(value, param, "isNumber").map(|_| ())
    }
}

/// Validates minimum value
#[derive(Debug, Clone, Copy)]
pub struct Min(pub f64);

impl Predicate for Min {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if number(value, param, "min")? >= self.0 {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} must be at least {}", param, self.0))
                    .with_constraint("min")
                    .with_value(shown(value)),
            )
        }
    }
}

/// Validates maximum value
#[derive(Debug, Clone, Copy)]
pub struct Max(pub f64);

impl Predicate for Max {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if number(value, param, "max")? <= self.0 {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} must be at most {}", param, self.0))
                    .with_constraint("max")
                    .with_value(shown(value)),
            )
        }
    }
}

/// Validates value is in an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct InRange {
    pub min: f64,
    pub max: f64,
}

impl Predicate for InRange {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        let n = number(value, param, "inRange")?;
        if n >= self.min && n <= self.max {
            Ok(())
        } else {
            Err(ValidationError::new(
                param,
                format!("{} must be between {} and {}", param, self.min, self.max),
            )
            .with_constraint("inRange")
            .with_value(shown(value)))
        }
    }
}

// String predicates

/// Validates that a value is a string
#[derive(Debug, Clone, Copy, Default)]
pub struct IsString;

impl Predicate for IsString {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        text(value, param, "isString").map(|_| ())
    }
}

/// Validates that a string is not blank
#[derive(Debug, Clone, Copy, Default)]
pub struct NotEmpty;

impl Predicate for NotEmpty {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if text(value, param, "notEmpty")?.trim().is_empty() {
            Err(
                ValidationError::new(param, format!("{} should not be empty", param))
                    .with_constraint("notEmpty"),
            )
        } else {
            Ok(())
        }
    }
}

/// Validates minimum string length (in characters)
#[derive(Debug, Clone, Copy)]
pub struct MinLength(pub usize);

impl Predicate for MinLength {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        let s = text(value, param, "minLength")?;
        if s.chars().count() < self.0 {
            Err(ValidationError::new(
                param,
                format!("{} must be at least {} characters", param, self.0),
            )
            .with_constraint("minLength")
            .with_value(s))
        } else {
            Ok(())
        }
    }
}

/// Validates maximum string length (in characters)
#[derive(Debug, Clone, Copy)]
pub struct MaxLength(pub usize);

impl Predicate for MaxLength {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        let s = text(value, param, "maxLength")?;
        if s.chars().count() > self.0 {
            Err(ValidationError::new(
                param,
                format!("{} must be at most {} characters", param, self.0),
            )
            .with_constraint("maxLength")
            .with_value(s))
        } else {
            Ok(())
        }
    }
}

/// Validates ASCII letters and digits only
#[derive(Debug, Clone, Copy, Default)]
pub struct IsAlphanumeric;

impl Predicate for IsAlphanumeric {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        let s = text(value, param, "isAlphanumeric")?;
        let matched = ALPHANUMERIC_REGEX
            .as_ref()
            .map(|re| re.is_match(s))
            .unwrap_or(false);
        if matched {
            Ok(())
        } else {
            Err(ValidationError::new(
                param,
                format!("{} must contain only letters and numbers", param),
            )
            .with_constraint("isAlphanumeric")
            .with_value(s))
        }
    }
}

/// Custom regex validator
#[derive(Debug, Clone)]
pub struct Matches(pub Regex);

impl Matches {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(pattern)?))
    }
}

impl Predicate for Matches {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        let s = text(value, param, "matches")?;
        if self.0.is_match(s) {
            Ok(())
        } else {
            Err(
                ValidationError::new(param, format!("{} does not match required pattern", param))
                    .with_constraint("matches")
                    .with_value(s),
            )
        }
    }
}

/// Validates the value is one of an allowed set
#[derive(Debug, Clone)]
pub struct OneOf(pub Vec<Value>);

impl Predicate for OneOf {
    fn check(&self, value: &Value, param: &str) -> Result<(), ValidationError> {
        if self.0.contains(value) {
            Ok(())
        } else {
            let allowed: Vec<String> = self.0.iter().map(shown).collect();
            Err(ValidationError::new(
                param,
                format!("{} must be one of: {}", param, allowed.join(", ")),
            )
            .with_constraint("oneOf")
            .with_value(shown(value)))
        }
    }
}
