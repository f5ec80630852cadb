//! Argument validation for Cinch
//!
//! Provides the [`ValidationError`] raised when a call is rejected, the
//! [`Predicate`] trait with built-in numeric and string predicates, and
//! [`ValidationRules`], an ordered list of (parameter, predicate) pairs.
//!
//! # Examples
//!
//! ## Positional rules
//!
//! ```
//! use cinch_validation::{IsPositive, ParamRef, ValidationRules};
//! use serde_json::{json, Value};
//!
//! let rules = ValidationRules::new().arg(IsPositive).arg(IsPositive);
//! let args = vec![json!(5), json!(-1)];
//!
//! let lookup = |param: &ParamRef| match param {
//!     ParamRef::Position(i) => args.get(*i),
//!     ParamRef::Name(_) => None,
//! };
//!
//! let err = rules.check(lookup).unwrap_err();
//! assert_eq!(err.param, "argument 1");
//! ```
//!
//! ## Custom predicates
//!
//! ```
//! use cinch_validation::{Predicate, ValidationError};
//! use serde_json::{json, Value};
//!
//! let even = |value: &Value, param: &str| match value.as_i64() {
//!     Some(n) if n % 2 == 0 => Ok(()),
//!     _ => Err(ValidationError::new(param, format!("{} must be even", param))),
//! };
//!
//! assert!(even.check(&json!(4), "n").is_ok());
//! assert!(even.check(&json!(3), "n").is_err());
//! ```

mod errors;
mod rules;
mod traits;
mod validators;

pub use errors::*;
pub use rules::*;
pub use traits::*;
pub use validators::*;
