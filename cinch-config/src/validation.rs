// Configuration validation

use crate::{ConfigError, Result};
use std::fmt::Display;

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable field checks returning `ConfigError::ValidationError`.
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(format!("{} cannot be empty", field)));
        }
        Ok(())
    }

    pub fn in_range<T: PartialOrd + Display>(value: T, min: T, max: T, field: &str) -> Result<()> {
        if value < min || value > max {
            return Err(ConfigError::invalid(format!(
                "{} must be between {} and {}, got {}",
                field, min, max, value
            )));
        }
        Ok(())
    }

    pub fn at_least<T: PartialOrd + Display>(value: T, min: T, field: &str) -> Result<()> {
        if value < min {
            return Err(ConfigError::invalid(format!(
                "{} must be at least {}, got {}",
                field, min, value
            )));
        }
        Ok(())
    }

    /// Finite and not negative.
    pub fn non_negative(value: f64, field: &str) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::invalid(format!(
                "{} must be a non-negative number, got {}",
                field, value
            )));
        }
        Ok(())
    }

    /// Case-insensitive membership test.
    pub fn one_of(value: &str, allowed: &[&str], field: &str) -> Result<()> {
        if !allowed.iter().any(|a| a.eq_ignore_ascii_case(value)) {
            return Err(ConfigError::invalid(format!(
                "{} must be one of [{}], got {:?}",
                field,
                allowed.join(", "),
                value
            )));
        }
        Ok(())
    }
}
