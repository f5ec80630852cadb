//! # Resilience
//!
//! Retry with configurable backoff, in two flavors sharing one
//! [`RetryConfig`]:
//!
//! - [`RetryLayer`]: a synchronous layer for composed invocables, sleeping
//!   through a [`Sleeper`](crate::Sleeper) between attempts
//! - [`Retry`]: an async executor for closures returning futures
//!
//! ## Quick Start
//!
//! ```rust
//! use cinch_core::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sleeper = Arc::new(RecordingSleeper::new());
//! let fetch = Composer::new(target("fetch", |_: &Invocation| {
//!     Err::<String, _>(Error::failure("ConnectionError", "network unreachable"))
//! }))
//! .layer(
//!     RetryLayer::new(RetryConfig::new(3).delay(Duration::from_millis(500)))
//!         .with_sink(Arc::new(MemorySink::new()))
//!         .with_sleeper(sleeper.clone()),
//! )
//! .build();
//!
//! assert!(fetch.call(&Invocation::new()).is_err());
//! assert_eq!(sleeper.delays().len(), 2);
//! ```

mod backoff;
mod layer;
mod retry;

pub use backoff::*;
pub use layer::*;
pub use retry::*;
