// Configuration loading for Cinch layers
//
// Sources are merged into one key/value store: files, `.env` files and
// prefixed environment variables. Later loads override earlier ones.

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use settings::Settings;
pub use validation::{ConfigValidator, Validate};

use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Thread-safe configuration store.
#[derive(Clone, Default)]
pub struct ConfigManager {
    config: Arc<RwLock<Map<String, Value>>>,
    env_prefix: Option<String>,
}

impl ConfigManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with environment variable prefix
    pub fn with_prefix(prefix: String) -> Self {
        Self {
            config: Arc::default(),
            env_prefix: Some(prefix),
        }
    }

    /// Load configuration from environment variables
    pub fn load_env(&self) -> Result<()> {
        let loader = EnvLoader::new(self.env_prefix.clone());
        let vars = loader.load()?;

        self.config.write().extend(vars);
        Ok(())
    }

    /// Load a `.env` file into the process environment, then the environment.
    ///
    /// Without a path a missing `.env` in the working directory is ignored.
    pub fn load_dotenv(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| ConfigError::LoadError(e.to_string()))?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        self.load_env()
    }

    /// Load a file, detecting its format from the name.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        self.load_file_as(path, loader.format())
    }

    pub fn load_file_as(&self, path: impl AsRef<Path>, format: FileFormat) -> Result<()> {
        let data = ConfigLoader::new(format).load_file(path)?;
        self.merge_value(data)
    }

    /// Merge a JSON object into the store.
    pub fn merge_value(&self, data: Value) -> Result<()> {
        match data {
            Value::Object(map) => {
                self.config.write().extend(map);
                Ok(())
            }
            other => Err(ConfigError::ParseError(format!(
                "expected a table of settings, found {}",
                other
            ))),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;

        self.config.write().insert(key.to_string(), json_value);
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let config = self.config.read();

        let value = config
            .get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        T::deserialize(value).map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.config.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.config.read().keys().cloned().collect()
    }

    /// Copy every entry of `other` over this store.
    pub fn merge(&self, other: &ConfigManager) {
        if Arc::ptr_eq(&self.config, &other.config) {
            return;
        }
        let entries = other.config.read().clone();
        self.config.write().extend(entries);
    }

    /// Deserialize the whole store and validate it.
    pub fn load_validated<T: DeserializeOwned + Validate>(&self) -> Result<T> {
        let snapshot = Value::Object(self.config.read().clone());

        let validated: T = serde_json::from_value(snapshot)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))?;

        validated.validate()?;
        Ok(validated)
    }

    /// Shorthand for `load_validated::<Settings>()`.
    pub fn settings(&self) -> Result<Settings> {
        self.load_validated()
    }
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("keys", &self.keys())
            .field("env_prefix", &self.env_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let manager = ConfigManager::new();
        manager.set("log_level", "DEBUG").unwrap();

        let value: String = manager.get("log_level").unwrap();
        assert_eq!(value, "DEBUG");
    }

    #[test]
    fn test_get_or_default() {
        let manager = ConfigManager::new();

        let value: u32 = manager.get_or("max_attempts", 3);
        assert_eq!(value, 3);
    }

    #[test]
    fn test_missing_key() {
        let manager = ConfigManager::new();
        assert!(matches!(
            manager.get::<String>("missing"),
            Err(ConfigError::KeyNotFound(_))
        ));
        assert!(!manager.has("missing"));
    }

    #[test]
    fn test_merge_overrides() {
        let base = ConfigManager::new();
        base.set("max_attempts", 3).unwrap();
        base.set("delay", 1.0).unwrap();

        let overrides = ConfigManager::new();
        overrides.set("max_attempts", 5).unwrap();

        base.merge(&overrides);
        base.merge(&base.clone());

        assert_eq!(base.get::<u32>("max_attempts").unwrap(), 5);
        assert_eq!(base.get::<f64>("delay").unwrap(), 1.0);
    }

    #[test]
    fn test_settings_from_store() {
        let manager = ConfigManager::new();
        manager.set("max_attempts", 2).unwrap();
        manager.set("retryable", vec!["ConnectionError"]).unwrap();

        let settings = manager.settings().unwrap();
        assert_eq!(settings.max_attempts, 2);
        assert_eq!(settings.retryable, vec!["ConnectionError"]);
    }

    #[test]
    fn test_rejects_non_table() {
        let manager = ConfigManager::new();
        assert!(manager.merge_value(Value::from(5)).is_err());
    }
}
