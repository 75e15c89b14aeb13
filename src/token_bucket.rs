// src/token_bucket.rs

// async-token-bucket: an async rate limiter based on the token bucket algorithm.

// dependencies
use crate::clock::{Clock, TokioClock};
use crate::config::LimiterConfig;
use crate::errors::{ClockError, LimiterError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// The main TokenBucketLimiter model.
/// C is the clock type, defaulting to TokioClock.
///
/// The bucket holds up to `max_capacity` tokens and is refilled at `rate`
/// tokens per second. Refill is lazy: it is computed from the elapsed time
/// whenever the limiter is used, there is no background task.
///
/// `tokens` and `last_update` sit behind a single async mutex. A caller that
/// finds the bucket empty keeps the lock while it waits, so no other debit can
/// slip in between its wait and its own recheck.
#[derive(Debug)]
pub struct TokenBucketLimiter<C = TokioClock>
where
    C: Clock,
{
    rate: f64,
    max_capacity: f64,
    state: Mutex<BucketState>,
    clock: C,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucketLimiter<TokioClock> {
    /// Build a limiter on the ambient tokio runtime.
    pub fn new(max_capacity: f64, rate_per_second: f64) -> Result<Self, LimiterError> {
        Self::with_config(
            LimiterConfig::new(max_capacity, rate_per_second),
            TokioClock::new(),
        )
    }
}

// methods for the TokenBucketLimiter type
impl<C> TokenBucketLimiter<C>
where
    C: Clock,
{
    // method to create a new limiter from a config object, starting with a full bucket
    pub fn with_config(config: LimiterConfig, clock: C) -> Result<Self, LimiterError> {
        config.validate()?;
        Ok(Self::from_validated(&config, clock))
    }

    // caller guarantees `config.validate()` already passed
    pub(crate) fn from_validated(config: &LimiterConfig, clock: C) -> Self {
        let last_update = clock.now();

        Self {
            rate: config.rate_per_second,
            max_capacity: config.max_capacity,
            state: Mutex::new(BucketState {
                tokens: config.max_capacity,
                last_update,
            }),
            clock,
        }
    }

    // accessor method to return the rate field (tokens per second)
    pub fn rate(&self) -> f64 {
        self.rate
    }

    // accessor method to return the bucket size
    pub fn max_capacity(&self) -> f64 {
        self.max_capacity
    }

    /// Wait until a token is available, then take it.
    ///
    /// Returns as soon as the caller may proceed. The only failure is
    /// [`LimiterError::SchedulingFailure`], when the clock cannot suspend the
    /// caller; in that case no token is taken.
    ///
    /// Cancel safe: dropping the returned future releases the lock and takes
    /// no token.
    pub async fn acquire(&self) -> Result<(), LimiterError> {
        let mut state = self.state.lock().await;
        self.update_token_count(&mut state);

        // a single wait normally suffices; the loop covers float and timer rounding
        while state.tokens < 1.0 {
            self.wait_for_next_token(state.tokens).await?;
            self.update_token_count(&mut state);
        }

        state.tokens -= 1.0;
        trace!(remaining = state.tokens, "token acquired");
        Ok(())
    }

    /// Take a token only if one is available right now.
    ///
    /// Returns `false` when the bucket is empty, and also when another caller
    /// currently holds the bucket (for instance while it waits for a refill).
    pub fn try_acquire(&self) -> bool {
        let Ok(mut state) = self.state.try_lock() else {
            return false;
        };
        self.update_token_count(&mut state);
        if state.tokens < 1.0 {
            return false;
        }
        state.tokens -= 1.0;
        trace!(remaining = state.tokens, "token acquired without waiting");
        true
    }

    /// Tokens a caller arriving now would find, refill included.
    /// Does not modify the bucket.
    pub async fn available_tokens(&self) -> f64 {
        let state = self.state.lock().await;
        self.refilled(&state, self.clock.now())
    }

    // true if nobody holds the bucket and it has not been touched for `max_idle`
    pub(crate) fn is_idle_for(&self, max_idle: Duration) -> bool {
        match self.state.try_lock() {
            Ok(state) => {
                self.clock
                    .now()
                    .saturating_duration_since(state.last_update)
                    >= max_idle
            }
            Err(_) => false,
        }
    }

    fn refilled(&self, state: &BucketState, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(state.last_update);
        (state.tokens + elapsed.as_secs_f64() * self.rate).min(self.max_capacity)
    }

    fn update_token_count(&self, state: &mut BucketState) {
        let now = self.clock.now();
        state.tokens = self.refilled(state, now);
        state.last_update = state.last_update.max(now);
    }

    async fn wait_for_next_token(&self, tokens: f64) -> Result<(), ClockError> {
        let deficit = 1.0 - tokens;
        let wait = wait_duration(deficit, self.rate);
        debug!(deficit, wait_secs = wait.as_secs_f64(), "bucket empty, waiting for refill");

        let sleep = self.clock.sleep(wait).inspect_err(|error| {
            warn!(%error, "unable to suspend while waiting for a token");
        })?;
        sleep.await;
        Ok(())
    }
}

// time needed to accumulate `deficit` tokens, rounded up to whole nanoseconds
fn wait_duration(deficit: f64, rate: f64) -> Duration {
    let nanos = (deficit / rate * 1_000_000_000.0).ceil();
    // float to int casts saturate
    Duration::from_nanos(nanos as u64)
}
