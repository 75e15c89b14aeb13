// src/errors.rs

// error handling for the token bucket limiter types

// dependencies
use thiserror::Error;

/// Configuration problems detected before a limiter is built.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("rate must be positive and finite, got {0}")]
    InvalidRate(f64),
    #[error("max capacity must be finite and at least 1, got {0}")]
    InvalidCapacity(f64),
}

/// Failures of a [`Clock`](crate::Clock) to suspend the caller.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    /// No handle was injected and the caller is not inside a tokio runtime.
    #[error("no tokio runtime available to schedule a timer")]
    NoRuntime,
    /// The runtime was built without `enable_time`.
    #[error("tokio runtime has timers disabled")]
    TimerDisabled,
    /// Escape hatch for custom clocks.
    #[error("clock unavailable: {0}")]
    Unavailable(String),
}

/// Error type returned by the limiters.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimiterError {
    /// Raised at construction only; fix the configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    /// Raised by `acquire` when the caller could not be suspended.
    #[error("scheduling failure: {0}")]
    SchedulingFailure(#[from] ClockError),
}
