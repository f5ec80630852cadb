// Environment variable loading

use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::env;

/// Prefix of every variable read by default.
pub const DEFAULT_PREFIX: &str = "CINCH";

/// Reads prefixed environment variables into JSON values.
///
/// `CINCH_MAX_ATTEMPTS=5` becomes the key `max_attempts` with the number `5`.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load every matching variable, keys lowercased without the prefix.
    pub fn load(&self) -> Result<Map<String, Value>> {
        Ok(self.collect(env::vars()))
    }

    fn collect(&self, vars: impl IntoIterator<Item = (String, String)>) -> Map<String, Value> {
        let mut config = Map::new();

        for (key, value) in vars {
            let key = match &self.prefix {
                Some(prefix) => match key.strip_prefix(prefix.as_str()) {
                    Some(rest) if rest.starts_with('_') => rest.trim_start_matches('_'),
                    _ => continue,
                },
                None => key.as_str(),
            };
            if key.is_empty() {
                continue;
            }
            config.insert(key.to_lowercase(), coerce(&value));
        }

        config
    }

    /// Load a single variable.
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix, key.to_uppercase()),
            None => key.to_uppercase(),
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}

/// Turn a raw string into a JSON scalar: bool, integer, float, or string.
pub fn coerce(raw: &str) -> Value {
    let trimmed = raw.trim();
    match trimmed.to_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    match trimmed.parse::<f64>() {
        Ok(float) if float.is_finite() => Value::from(float),
        _ => Value::String(raw.to_string()),
    }
}
