//! Delay strategies applied between retry attempts.

use std::fmt;
use std::time::Duration;

/// Ceiling used by the growing strategies unless overridden.
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(60);

/// Backoff strategy for retries.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Linear backoff: delay increases by a fixed amount.
    Linear {
        /// Initial delay.
        initial: Duration,
        /// Increment per retry.
        increment: Duration,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff: delay is multiplied each retry.
    Exponential {
        /// Initial delay.
        initial: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
        /// Maximum delay.
        max: Duration,
    },
    /// Exponential backoff plus up to 50% random jitter.
    ExponentialWithJitter {
        /// Initial delay.
        initial: Duration,
        /// Multiplier (typically 2.0).
        multiplier: f64,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Create constant backoff.
    pub fn constant(delay: Duration) -> Self {
        Self::Constant(delay)
    }

    /// Create linear backoff.
    pub fn linear(initial: Duration, increment: Duration) -> Self {
        Self::Linear {
            initial,
            increment,
            max: DEFAULT_MAX_DELAY,
        }
    }

    /// Create exponential backoff.
    pub fn exponential(initial: Duration) -> Self {
        Self::Exponential {
            initial,
            multiplier: 2.0,
            max: DEFAULT_MAX_DELAY,
        }
    }

    /// Create exponential backoff with jitter.
    pub fn exponential_with_jitter(initial: Duration) -> Self {
        Self::ExponentialWithJitter {
            initial,
            multiplier: 2.0,
            max: DEFAULT_MAX_DELAY,
        }
    }

    /// Set maximum delay. No effect on `None` and `Constant`.
    pub fn with_max(self, max: Duration) -> Self {
        match self {
            Self::Linear {
                initial, increment, ..
            } => Self::Linear {
                initial,
                increment,
                max,
            },
            Self::Exponential {
                initial,
                multiplier,
                ..
            } => Self::Exponential {
                initial,
                multiplier,
                max,
            },
            Self::ExponentialWithJitter {
                initial,
                multiplier,
                ..
            } => Self::ExponentialWithJitter {
                initial,
                multiplier,
                max,
            },
            other => other,
        }
    }

    /// Short name of the strategy (`"constant"`, `"exponential"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Constant(_) => "constant",
            Self::Linear { .. } => "linear",
            Self::Exponential { .. } => "exponential",
            Self::ExponentialWithJitter { .. } => "exponential_jitter",
        }
    }

    /// Calculate delay for a given retry (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Linear {
                initial,
                increment,
                max,
            } => {
                let delay = initial.saturating_add(increment.saturating_mul(attempt));
                delay.min(*max)
            }
            Self::Exponential {
                initial,
                multiplier,
                max,
            } => scale(*initial, *multiplier, attempt).min(*max),
            Self::ExponentialWithJitter {
                initial,
                multiplier,
                max,
            } => {
                let base = scale(*initial, *multiplier, attempt);
                let jitter = base.mul_f64(fastrand::f64() * 0.5);
                base.saturating_add(jitter).min(*max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Constant(Duration::from_secs(1))
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Constant(d) => write!(f, "constant {:?}", d),
            Self::Linear {
                initial, increment, ..
            } => write!(f, "linear {:?} +{:?}", initial, increment),
            Self::Exponential {
                initial,
                multiplier,
                ..
            }
            | Self::ExponentialWithJitter {
                initial,
                multiplier,
                ..
            } => write!(f, "{} {:?} x{}", self.kind(), initial, multiplier),
        }
    }
}

fn scale(initial: Duration, multiplier: f64, attempt: u32) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let factor = multiplier.powi(exponent);
    let secs = initial.as_secs_f64() * factor;
    if secs.is_finite() && secs >= 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::MAX
    }
}
