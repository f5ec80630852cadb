// Configuration file loaders

use crate::env::coerce;
use crate::{ConfigError, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect the format of `path`. A bare `.env` file counts as env.
    pub fn detect(path: &Path) -> Option<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Some(FileFormat::Env);
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Configuration file loader
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::detect(path).ok_or_else(|| {
            ConfigError::LoadError(format!("Unsupported config file: {}", path.display()))
        })?;

        Ok(Self::new(format))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => parse_json(content),
            FileFormat::Toml => parse_toml(content),
            FileFormat::Env => Ok(parse_env(content)),
        }
    }
}

fn parse_json(content: &str) -> Result<Value> {
    serde_json::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
}

fn parse_toml(content: &str) -> Result<Value> {
    let table: toml::Table = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

    serde_json::to_value(table).map_err(|e| ConfigError::SerializationError(e.to_string()))
}

/// `KEY=value` lines; keys are lowercased and values coerced like env vars.
fn parse_env(content: &str) -> Value {
    let mut map = Map::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            map.insert(key.trim().to_lowercase(), coerce(value));
        }
    }

    Value::Object(map)
}
