// Core library for Cinch
// Wraps arbitrary callables with validation, timing, logging and retry layers

pub mod clock;
pub mod compose;
pub mod context;
pub mod error;
pub mod invocable;
pub mod logging;
pub mod resilience;
pub mod timing;
pub mod validate;

// Re-export commonly used types
pub use clock::*;
pub use compose::*;
pub use context::*;
pub use error::*;
pub use invocable::*;
pub use logging::*;
pub use resilience::*;
pub use timing::*;
pub use validate::*;

pub use cinch_log::{Event, LogSink, MemorySink, Phase, SharedSink, Sink, StderrSink, StdoutSink, default_sink};
pub use cinch_validation::{ParamRef, Predicate, ValidationError, ValidationRules};
