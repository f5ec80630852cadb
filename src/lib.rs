// Cinch - composable wrappers around ordinary callables
//
// This library layers argument validation, timing, lifecycle logging and
// retry with backoff around a function without changing its name or its
// return contract.

// Re-export core functionality
pub use cinch_core::*;

// Re-export the supporting crates
pub use cinch_log;
pub use cinch_validation;

#[cfg(feature = "config")]
pub use cinch_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        BackoffStrategy,
        Composer,
        Composite,
        Error,
        Event,
        Fault,
        Invocable,
        Invocation,
        Layer,
        LoggingConfig,
        LoggingLayer,
        MemorySink,
        Phase,
        RetryConfig,
        RetryLayer,
        RetryableErrors,
        Sink,
        TimeUnit,
        TimingConfig,
        TimingLayer,
        ValidationError,
        ValidationLayer,
        ValidationRules,
        compose,
        target,
    };

    pub use cinch_validation::{
        InRange, IsInteger, IsNonNegative, IsNumber, IsPositive, IsString, MaxLength, MinLength,
        NotEmpty, OneOf,
    };

    #[cfg(feature = "config")]
    pub use cinch_config::{ConfigManager, Settings};
}
