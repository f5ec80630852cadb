// Layer settings read from configuration sources

use crate::env::DEFAULT_PREFIX;
use crate::{ConfigError, ConfigManager, ConfigValidator, Result, Validate};
use cinch_core::{
    BackoffStrategy, LoggingConfig, RetryConfig, RetryableErrors, SharedSink, StdoutSink,
    TimeUnit, TimingConfig,
};
use cinch_log::Format;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Flat settings for every layer.
///
/// Every field has a default, so an empty source yields the stock
/// configuration: 3 attempts, 1 s constant delay, all errors retryable,
/// seconds, `INFO`, JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_attempts: u32,
    /// Base delay between attempts, in seconds.
    pub delay: f64,
    /// Upper bound for growing backoffs, in seconds.
    pub max_delay: Option<f64>,
    /// `none`, `constant`, `linear`, `exponential` or `exponential_jitter`.
    pub backoff: String,
    /// Retryable error kinds. Empty means every kind. A comma separated
    /// string is accepted as well as a list.
    #[serde(deserialize_with = "kinds")]
    pub retryable: Vec<String>,
    pub time_unit: String,
    pub log_level: String,
    pub log_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: 1.0,
            max_delay: None,
            backoff: "constant".to_string(),
            retryable: Vec::new(),
            time_unit: "seconds".to_string(),
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

fn kinds<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Kinds {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Kinds::deserialize(deserializer)? {
        Kinds::List(list) => list,
        Kinds::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

impl Settings {
    /// Read `CINCH_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let manager = ConfigManager::with_prefix(DEFAULT_PREFIX.to_string());
        manager.load_env()?;
        manager.load_validated()
    }

    /// Read a JSON, TOML or env file, then let `CINCH_*` variables override it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let manager = ConfigManager::with_prefix(DEFAULT_PREFIX.to_string());
        manager.load_file(path)?;
        manager.load_env()?;
        manager.load_validated()
    }

    fn duration(seconds: f64, field: &str) -> Result<Duration> {
        ConfigValidator::non_negative(seconds, field)?;
        Duration::try_from_secs_f64(seconds)
            .map_err(|e| ConfigError::invalid(format!("{} is out of range: {}", field, e)))
    }

    pub fn backoff_strategy(&self) -> Result<BackoffStrategy> {
        let delay = Self::duration(self.delay, "delay")?;
        let strategy = match self.backoff.to_lowercase().as_str() {
            "none" => BackoffStrategy::None,
            "constant" => BackoffStrategy::constant(delay),
            "linear" => BackoffStrategy::linear(delay, delay),
            "exponential" => BackoffStrategy::exponential(delay),
            "exponential_jitter" => BackoffStrategy::exponential_with_jitter(delay),
            other => {
                return Err(ConfigError::invalid(format!("unknown backoff {:?}", other)));
            }
        };

        match self.max_delay {
            Some(max) => Ok(strategy.with_max(Self::duration(max, "max_delay")?)),
            None => Ok(strategy),
        }
    }

    pub fn retry_config(&self) -> Result<RetryConfig> {
        ConfigValidator::at_least(self.max_attempts, 1, "max_attempts")?;

        let retryable = if self.retryable.is_empty() {
            RetryableErrors::All
        } else {
            RetryableErrors::kinds(self.retryable.iter().cloned())
        };

        Ok(RetryConfig::new(self.max_attempts)
            .backoff(self.backoff_strategy()?)
            .retryable(retryable))
    }

    pub fn time_unit(&self) -> Result<TimeUnit> {
        TimeUnit::from_str(&self.time_unit).ok_or_else(|| {
            ConfigError::invalid(format!("unknown time unit {:?}", self.time_unit))
        })
    }

    pub fn timing_config(&self) -> Result<TimingConfig> {
        Ok(TimingConfig::new(self.time_unit()?).level(self.log_level.clone()))
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new(self.log_level.clone())
    }

    pub fn log_format(&self) -> Result<Format> {
        Format::from_str(&self.log_format).ok_or_else(|| {
            ConfigError::invalid(format!("unknown log format {:?}", self.log_format))
        })
    }

    /// Stdout sink in the configured format.
    pub fn sink(&self) -> Result<SharedSink> {
        Ok(Arc::new(StdoutSink::new(self.log_format()?)))
    }
}

// Names are checked by the same parsers the layers use.
impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::at_least(self.max_attempts, 1, "max_attempts")?;
        self.backoff_strategy()?;
        self.time_unit()?;
        self.log_format()?;
        ConfigValidator::not_empty(&self.log_level, "log_level")
    }
}
