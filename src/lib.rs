// src/lib.rs

//! # Async Token Bucket
//!
//! An async rate limiter based on the token bucket algorithm.
//!
//! The bucket holds up to `max_capacity` tokens and is refilled lazily at
//! `rate` tokens per second. [`TokenBucketLimiter::acquire`] suspends the
//! calling task until a token is available and then takes it, so bursts are
//! bounded by the capacity and the long-run admission rate by `rate`.
//!
//! ## Quick Example
//!
//! ```rust
//! use async_token_bucket::TokenBucketLimiter;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), async_token_bucket::LimiterError> {
//! // bursts of up to 5, then 10 per second
//! let limiter = TokenBucketLimiter::new(5.0, 10.0)?;
//!
//! for _ in 0..5 {
//!     limiter.acquire().await?;
//!     // rate limited work goes here
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Timers run on the caller's tokio runtime unless a handle is injected with
//! [`TokioClock::with_handle`]. [`KeyedLimiter`] keeps a separate bucket per
//! key.

// private modules
mod clock;
mod config;
mod errors;
mod keyed;
mod token_bucket;

// public API exports
pub use clock::{Clock, SleepFuture, TokioClock};
pub use config::{DEFAULT_MAX_CAPACITY, DEFAULT_RATE, LimiterConfig};
pub use errors::{ClockError, ConfigError, LimiterError};
pub use keyed::KeyedLimiter;
pub use token_bucket::TokenBucketLimiter;
