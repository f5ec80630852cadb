// Severity levels and output formats

use std::fmt;

/// Severity of an event.
///
/// Layers label events with free-form strings; [`Level::from_label`] maps a
/// label onto this scale for filtering and for the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// Filter threshold that lets nothing through.
    Off = 5,
}

impl Level {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" | "warning" => Some(Level::Warn),
            "error" | "critical" => Some(Level::Error),
            "off" | "none" => Some(Level::Off),
            _ => None,
        }
    }

    /// Map a free-form label onto a level. Unknown labels count as `Info`.
    pub fn from_label(label: &str) -> Self {
        Self::from_str(label).unwrap_or(Level::Info)
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Level::Trace,
            1 => Level::Debug,
            2 => Level::Info,
            3 => Level::Warn,
            4 => Level::Error,
            _ => Level::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Off => "OFF",
        }
    }

    /// Matching level of the `log` facade, `None` for `Off`.
    pub fn to_log(&self) -> Option<log::Level> {
        match self {
            Level::Trace => Some(log::Level::Trace),
            Level::Debug => Some(log::Level::Debug),
            Level::Info => Some(log::Level::Info),
            Level::Warn => Some(log::Level::Warn),
            Level::Error => Some(log::Level::Error),
            Level::Off => None,
        }
    }

    #[cfg(feature = "color")]
    pub(crate) fn paint(&self, label: &str) -> String {
        use colored::Colorize;
        match self {
            Level::Trace => label.magenta().to_string(),
            Level::Debug => label.blue().to_string(),
            Level::Info => label.green().to_string(),
            Level::Warn => label.yellow().to_string(),
            Level::Error => label.red().bold().to_string(),
            Level::Off => label.to_string(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How console sinks render an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `[LEVEL] target phase: message {payload}`
    Pretty,
    /// Time, level initial, target and message
    Compact,
    /// One JSON document per line
    Json,
}

impl Format {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(Format::Pretty),
            "compact" => Some(Format::Compact),
            "json" => Some(Format::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Pretty => "pretty",
            Format::Compact => "compact",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
