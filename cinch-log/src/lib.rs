//! Cinch Logging
//!
//! Lifecycle events reported by wrapper layers, and the sinks that receive
//! them.
//!
//! # Usage
//!
//! ```rust
//! use cinch_log::{Event, MemorySink, Phase, Sink};
//!
//! let sink = MemorySink::new();
//! sink.emit(&Event::new("INFO", "greet", Phase::Start, "calling greet"));
//!
//! assert_eq!(sink.phases(), vec![Phase::Start]);
//! ```
//!
//! # Environment Variables
//!
//! Console sinks ([`StdoutSink`], [`StderrSink`]) read their defaults once:
//!
//! - `CINCH_LOG_LEVEL=trace|debug|info|warn|error|off` - drop events below this level
//! - `CINCH_DEBUG=1` - shorthand for `CINCH_LOG_LEVEL=trace`
//! - `CINCH_LOG_FORMAT=pretty|compact|json` - rendering
//! - `CINCH_LOG_COLOR=1|0` - color level labels in pretty output
//! - `CINCH_LOG_TIMESTAMPS=1|0` - timestamps in pretty output

mod config;
mod event;
mod level;
mod sink;

pub use config::{LogConfig, config, current_level, init, is_enabled, set_level};
pub use event::{Event, Phase};
pub use level::{Format, Level};
pub use sink::{LogSink, MemorySink, SharedSink, Sink, StderrSink, StdoutSink, default_sink};

#[cfg(feature = "tracing")]
pub mod tracing_compat {
    //! Subscriber for the `tracing` diagnostics the layers emit.
    //!
    //! Uses `RUST_LOG` when set, otherwise the Cinch console threshold.

    use crate::current_level;

    pub fn subscriber() -> impl tracing::Subscriber {
        use tracing_subscriber::prelude::*;
        use tracing_subscriber::{EnvFilter, fmt};

        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(current_level().as_str().to_lowercase()));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_ansi(crate::config().color))
    }

    /// Install [`subscriber`] as the global default. Returns false if one
    /// was already set.
    pub fn install() -> bool {
        tracing::subscriber::set_global_default(subscriber()).is_ok()
    }
}
