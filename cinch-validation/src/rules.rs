// Ordered validation rules for call arguments

use crate::{Predicate, ValidationError, ValidationErrors};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Reference to one argument of a call, by position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamRef {
    /// Zero-based positional argument
    Position(usize),
    /// Named argument
    Name(String),
}

impl fmt::Display for ParamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamRef::Position(index) => write!(f, "argument {}", index),
            ParamRef::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for ParamRef {
    fn from(index: usize) -> Self {
        ParamRef::Position(index)
    }
}

impl From<&str> for ParamRef {
    fn from(name: &str) -> Self {
        ParamRef::Name(name.to_string())
    }
}

impl From<String> for ParamRef {
    fn from(name: String) -> Self {
        ParamRef::Name(name)
    }
}

#[derive(Clone)]
struct Rule {
    param: ParamRef,
    label: String,
    predicate: Arc<dyn Predicate>,
}

/// Builder for an ordered list of (parameter, predicate) pairs.
///
/// Rules run in the order they were added. Arguments the call does not
/// supply are skipped.
#[derive(Clone, Default)]
pub struct ValidationRules {
    rules: Vec<Rule>,
    next_position: usize,
}

impl ValidationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check the next positional argument.
    pub fn arg<P: Predicate + 'static>(mut self, predicate: P) -> Self {
        let position = self.next_position;
        self.next_position += 1;
        self.rule(ParamRef::Position(position), predicate)
    }

    /// Leave the next positional argument unchecked.
    pub fn skip(mut self) -> Self {
        self.next_position += 1;
        self
    }

    /// Check a named argument.
    pub fn named<P: Predicate + 'static>(self, name: impl Into<String>, predicate: P) -> Self {
        self.rule(ParamRef::Name(name.into()), predicate)
    }

    /// Check an arbitrary parameter.
    pub fn rule<P: Predicate + 'static>(mut self, param: impl Into<ParamRef>, predicate: P) -> Self {
        let param = param.into();
        if let ParamRef::Position(index) = param {
            self.next_position = self.next_position.max(index + 1);
        }
        self.rules.push(Rule {
            label: param.to_string(),
            param,
            predicate: Arc::new(predicate),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Parameters in rule order.
    pub fn params(&self) -> impl Iterator<Item = &ParamRef> {
        self.rules.iter().map(|rule| &rule.param)
    }

    /// Run the rules in order and stop at the first failure.
    pub fn check<'a, L>(&self, lookup: L) -> Result<(), ValidationError>
    where
        L: Fn(&ParamRef) -> Option<&'a Value>,
    {
        for rule in &self.rules {
            if let Some(value) = lookup(&rule.param) {
                rule.predicate.check(value, &rule.label)?;
            }
        }
        Ok(())
    }

    /// Run every rule and collect all failures.
    pub fn validate_all<'a, L>(&self, lookup: L) -> Result<(), ValidationErrors>
    where
        L: Fn(&ParamRef) -> Option<&'a Value>,
    {
        let errors: Vec<ValidationError> = self
            .rules
            .iter()
            .filter_map(|rule| {
                lookup(&rule.param).and_then(|value| rule.predicate.check(value, &rule.label).err())
            })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

impl fmt::Debug for ValidationRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationRules")
            .field("params", &self.rules.iter().map(|r| &r.label).collect::<Vec<_>>())
            .finish()
    }
}
