// Event sinks

use crate::{Event, Format, Phase, config, is_enabled};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for lifecycle events.
///
/// Implementations must accept concurrent calls; each event is written as
/// one unit.
pub trait Sink: Send + Sync {
    fn emit(&self, event: &Event);
}

/// Shared handle used by layers.
pub type SharedSink = Arc<dyn Sink>;

impl<S: Sink + ?Sized> Sink for Arc<S> {
    fn emit(&self, event: &Event) {
        (**self).emit(event)
    }
}

/// Sink used when a layer is not given one: stdout in the configured format.
pub fn default_sink() -> SharedSink {
    Arc::new(StdoutSink::default())
}

#[derive(Debug, Clone, Copy)]
struct Style {
    format: Format,
    timestamps: bool,
    color: bool,
}

impl Style {
    fn from_config() -> Self {
        let config = config();
        Self {
            format: config.format,
            timestamps: config.timestamps,
            color: config.color,
        }
    }

    fn plain(format: Format) -> Self {
        Self {
            format,
            timestamps: true,
            color: false,
        }
    }

    fn render(&self, event: &Event) -> String {
        match self.format {
            Format::Pretty => event.render_pretty(self.timestamps, self.color),
            Format::Compact => event.render_compact(),
            Format::Json => event.render_json(),
        }
    }

    /// Render and write with one locked call, unless the event is below the
    /// console threshold.
    fn write(&self, event: &Event, out: &mut dyn Write) {
        if !is_enabled(event.severity()) {
            return;
        }
        let _ = out.write_all(self.render(event).as_bytes());
    }
}

/// Writes events to standard output.
#[derive(Debug, Clone, Copy)]
pub struct StdoutSink {
    style: Style,
}

impl StdoutSink {
    pub fn new(format: Format) -> Self {
        Self {
            style: Style::plain(format),
        }
    }

    /// Toggle timestamps in pretty output.
    pub fn with_timestamps(mut self, timestamps: bool) -> Self {
        self.style.timestamps = timestamps;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.style.color = color;
        self
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self {
            style: Style::from_config(),
        }
    }
}

impl Sink for StdoutSink {
    fn emit(&self, event: &Event) {
        self.style.write(event, &mut std::io::stdout().lock());
    }
}

/// Writes events to standard error.
#[derive(Debug, Clone, Copy)]
pub struct StderrSink {
    style: Style,
}

impl StderrSink {
    pub fn new(format: Format) -> Self {
        Self {
            style: Style::plain(format),
        }
    }
}

impl Default for StderrSink {
    fn default() -> Self {
        Self {
            style: Style::from_config(),
        }
    }
}

impl Sink for StderrSink {
    fn emit(&self, event: &Event) {
        self.style.write(event, &mut std::io::stderr().lock());
    }
}

/// Forwards events to the `log` facade, target = wrapped identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn emit(&self, event: &Event) {
        if let Some(level) = event.severity().to_log() {
            if event.payload.is_null() {
                log::log!(target: event.target.as_str(), level, "{}: {}", event.phase, event.message);
            } else {
                log::log!(
                    target: event.target.as_str(),
                    level,
                    "{}: {} {}",
                    event.phase,
                    event.message,
                    event.payload
                );
            }
        }
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Phases in emission order.
    pub fn phases(&self) -> Vec<Phase> {
        self.events.lock().iter().map(|e| e.phase).collect()
    }

    /// Number of events with the given phase.
    pub fn count(&self, phase: Phase) -> usize {
        self.events.lock().iter().filter(|e| e.phase == phase).count()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Sink for MemorySink {
    fn emit(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
