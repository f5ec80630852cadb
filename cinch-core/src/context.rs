// Invocation context: the arguments of one call

use cinch_validation::{ParamRef, ValidationError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Positional and named arguments of a single call.
///
/// Every layer and the target read the same context; layers never rewrite
/// it, so each retry attempt sees the original arguments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(default)]
    args: Vec<Value>,
    #[serde(default)]
    kwargs: Map<String, Value>,
}

impl Invocation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional arguments.
    pub fn with_args<I, V>(args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            kwargs: Map::new(),
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    /// No positional and no named arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty() && self.kwargs.is_empty()
    }

    /// Raw value of a parameter, if supplied.
    pub fn get(&self, param: &ParamRef) -> Option<&Value> {
        match param {
            ParamRef::Position(index) => self.args.get(*index),
            ParamRef::Name(name) => self.kwargs.get(name),
        }
    }

    /// Typed value of a required parameter.
    pub fn param<T: DeserializeOwned>(&self, param: impl Into<ParamRef>) -> Result<T, ValidationError> {
        let param = param.into();
        match self.get(&param) {
            Some(value) => decode(&param, value),
            None => Err(
                ValidationError::new(param.to_string(), format!("{} is required", param))
                    .with_constraint("required"),
            ),
        }
    }

    /// Typed value of an optional parameter.
    pub fn param_or<T: DeserializeOwned>(
        &self,
        param: impl Into<ParamRef>,
        default: T,
    ) -> Result<T, ValidationError> {
        let param = param.into();
        match self.get(&param) {
            Some(value) => decode(&param, value),
            None => Ok(default),
        }
    }

    /// Arguments as a JSON payload, leaving out empty groups.
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        if !self.args.is_empty() {
            payload.insert("args".to_string(), Value::Array(self.args.clone()));
        }
        if !self.kwargs.is_empty() {
            payload.insert("kwargs".to_string(), Value::Object(self.kwargs.clone()));
        }
        Value::Object(payload)
    }
}

fn decode<T: DeserializeOwned>(param: &ParamRef, value: &Value) -> Result<T, ValidationError> {
    T::deserialize(value).map_err(|e| {
        ValidationError::new(param.to_string(), format!("{} has the wrong type: {}", param, e))
            .with_constraint("type")
            .with_value(value.to_string())
    })
}
