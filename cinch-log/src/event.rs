// Lifecycle events emitted by wrapper layers

use crate::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stage of a wrapped call an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// A call entered the logging layer.
    Start,
    /// Arguments of the call.
    Args,
    /// The call returned a value.
    Success,
    /// The call failed.
    Failure,
    /// The retry layer is about to delegate inward.
    Attempt,
    /// An attempt failed and another one will follow.
    Retry,
    /// A call succeeded after at least one failed attempt.
    Recovered,
    /// Every attempt failed.
    Exhausted,
    /// Elapsed time of a successful call.
    Timing,
    /// Named arguments checked by the validation layer.
    Validation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Start => "start",
            Phase::Args => "args",
            Phase::Success => "success",
            Phase::Failure => "failure",
            Phase::Attempt => "attempt",
            Phase::Retry => "retry",
            Phase::Recovered => "recovered",
            Phase::Exhausted => "exhausted",
            Phase::Timing => "timing",
            Phase::Validation => "validation",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structured observation about a wrapped call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Free-form level label (`INFO`, `DEBUG`, ...)
    pub level: String,
    pub timestamp: DateTime<Utc>,
    /// Identity of the wrapped target
    pub target: String,
    pub phase: Phase,
    /// Human readable summary
    pub message: String,
    /// Arguments, return value, error details or measurements
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Event {
    pub fn new(
        level: impl Into<String>,
        target: impl Into<String>,
        phase: Phase,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level: level.into(),
            timestamp: Utc::now(),
            target: target.into(),
            phase,
            message: message.into(),
            payload: Value::Null,
        }
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Severity of the level label, for filtering and facade forwarding.
    pub fn severity(&self) -> Level {
        Level::from_label(&self.level)
    }

    /// Render as a single pretty line, including the trailing newline.
    ///
    /// `color` only has an effect with the `color` feature.
    pub fn render_pretty(&self, timestamps: bool, color: bool) -> String {
        let mut line = String::new();
        if timestamps {
            let local = self.timestamp.with_timezone(&chrono::Local);
            line.push_str(&format!("{} ", local.format("%Y-%m-%d %H:%M:%S")));
        }

        #[cfg(feature = "color")]
        let label = if color {
            self.severity().paint(&self.level)
        } else {
            self.level.clone()
        };
        #[cfg(not(feature = "color"))]
        let label = {
            let _ = color;
            self.level.clone()
        };

        line.push_str(&format!(
            "[{}] {} {}: {}",
            label, self.target, self.phase, self.message
        ));
        if !self.payload.is_null() {
            line.push_str(&format!(" {}", self.payload));
        }
        line.push('\n');
        line
    }

    /// Render as a compact line.
    pub fn render_compact(&self) -> String {
        format!(
            "{} {} {} {}\n",
            self.timestamp.format("%H:%M:%S"),
            self.level.chars().next().unwrap_or('?'),
            self.target,
            self.message
        )
    }

    /// Render as one JSON document per line.
    pub fn render_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("{}\n", json),
            Err(_) => String::new(),
        }
    }
}
