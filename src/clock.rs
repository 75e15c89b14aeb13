// src/clock.rs

// clock module definition and implementations

// dependencies
use crate::errors::ClockError;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;

/// Future returned by [`Clock::sleep`].
pub type SleepFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Clock trait to abstract monotonic time and suspension.
/// Implementors must be thread-safe (Send + Sync).
/// `now` must never go backwards.
/// `sleep` must suspend the calling task without blocking its thread.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration) -> Result<SleepFuture, ClockError>;
}

/// Clock backed by the tokio timer.
///
/// Time is read through [`tokio::time::Instant`], so a runtime with paused
/// time (`start_paused`) is honoured. Sleeps are registered on the injected
/// runtime handle if there is one, otherwise on the runtime the caller is
/// running in. If neither exists, `sleep` fails with
/// [`ClockError::NoRuntime`]; a runtime is never created implicitly. A
/// runtime built without `enable_time` yields [`ClockError::TimerDisabled`].
#[derive(Debug, Clone, Default)]
pub struct TokioClock {
    handle: Option<Handle>,
}

impl TokioClock {
    /// Use whichever runtime the caller is in at the time of each sleep.
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Always read time from and schedule timers on `handle`.
    ///
    /// The handle's runtime must outlive the limiter. Once that runtime has
    /// shut down, a pending wait panics inside tokio when it is polled.
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        // an injected runtime may run on paused time; read the same clock it sleeps on
        let _guard = self.handle.as_ref().map(Handle::enter);
        tokio::time::Instant::now().into_std()
    }

    fn sleep(&self, duration: Duration) -> Result<SleepFuture, ClockError> {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|_| ClockError::NoRuntime)?,
        };
        // the Sleep binds to the timer of the runtime entered at creation
        let _guard = handle.enter();
        // tokio panics here when the runtime was built without timers
        let sleep = panic::catch_unwind(AssertUnwindSafe(|| tokio::time::sleep(duration)))
            .map_err(|_| ClockError::TimerDisabled)?;
        Ok(Box::pin(sleep))
    }
}
