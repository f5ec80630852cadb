// Process-wide output settings read from CINCH_LOG_* variables

use crate::{Format, Level};
use once_cell::sync::Lazy;
use std::env;
use std::io::IsTerminal;
use std::sync::atomic::{AtomicU8, Ordering};

static CONFIG: Lazy<LogConfig> = Lazy::new(LogConfig::from_env);

// Seeded from CONFIG on first use, adjustable at runtime.
static THRESHOLD: Lazy<AtomicU8> = Lazy::new(|| AtomicU8::new(CONFIG.level as u8));

/// Settings shared by the console sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Events below this severity are dropped by console sinks
    pub level: Level,
    pub format: Format,
    /// Color the level label in pretty output (needs the `color` feature)
    pub color: bool,
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            format: Format::Json,
            color: false,
            timestamps: true,
        }
    }
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

impl LogConfig {
    /// Read `CINCH_DEBUG`, `CINCH_LOG_LEVEL`, `CINCH_LOG_FORMAT`,
    /// `CINCH_LOG_COLOR` and `CINCH_LOG_TIMESTAMPS`.
    ///
    /// Layers report attempts and validation at `DEBUG`, so that is the
    /// default threshold. `CINCH_DEBUG=1` lowers it to `TRACE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let debug = env_flag("CINCH_DEBUG").unwrap_or(false);

        let level = env::var("CINCH_LOG_LEVEL")
            .ok()
            .and_then(|s| Level::from_str(&s))
            .unwrap_or(if debug { Level::Trace } else { defaults.level });

        let format = env::var("CINCH_LOG_FORMAT")
            .ok()
            .and_then(|s| Format::from_str(&s))
            .unwrap_or(defaults.format);

        let color = env_flag("CINCH_LOG_COLOR")
            .unwrap_or_else(|| env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal());

        Self {
            level,
            format,
            color,
            timestamps: env_flag("CINCH_LOG_TIMESTAMPS").unwrap_or(defaults.timestamps),
        }
    }
}

/// Force the environment to be read now rather than on the first event.
pub fn init() {
    Lazy::force(&THRESHOLD);
}

/// Configuration read from the environment.
pub fn config() -> &'static LogConfig {
    &CONFIG
}

pub fn current_level() -> Level {
    Level::from_u8(THRESHOLD.load(Ordering::Relaxed))
}

/// Change the console threshold at runtime.
pub fn set_level(level: Level) {
    THRESHOLD.store(level as u8, Ordering::SeqCst);
}

#[inline]
pub fn is_enabled(level: Level) -> bool {
    level != Level::Off && level >= current_level()
}
