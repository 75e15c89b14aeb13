// tests/limiter/error_tests.rs

#[cfg(test)]
mod tests {
    use crate::{TestClock, assert_close};
    use async_token_bucket::{
        Clock, ClockError, ConfigError, KeyedLimiter, LimiterConfig, LimiterError, TokenBucketLimiter,
        TokioClock,
    };
    use std::future::Future;
    use std::panic::{self, AssertUnwindSafe};
    use std::pin::pin;
    use std::task::{Context, Poll, Waker};
    use std::time::Duration;

    // poll a future once without any runtime around it
    fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
        let mut future = pin!(future);
        let mut cx = Context::from_waker(Waker::noop());
        future.as_mut().poll(&mut cx)
    }

    #[tokio::test]
    async fn clock_failure_surfaces_as_scheduling_failure() {
        let clock = TestClock::new();
        let config = LimiterConfig::new(1.0, 1.0);
        let limiter = TokenBucketLimiter::with_config(config, clock.clone()).unwrap();

        limiter.acquire().await.unwrap();

        clock.fail_next_sleep();
        let result = limiter.acquire().await;
        match result {
            Err(LimiterError::SchedulingFailure(ClockError::Unavailable(_))) => {} // Expected
            other => panic!("Expected SchedulingFailure, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_acquire_takes_no_token_and_releases_bucket() {
        let clock = TestClock::new();
        let config = LimiterConfig::new(1.0, 1.0);
        let limiter = TokenBucketLimiter::with_config(config, clock.clone()).unwrap();

        limiter.acquire().await.unwrap();
        clock.fail_next_sleep();
        assert!(limiter.acquire().await.is_err());

        // the bucket is usable again and still exactly one token short
        assert_close(limiter.available_tokens().await, 0.0);
        limiter.acquire().await.unwrap();
        assert_close(clock.slept(), 1.0);
    }

    #[tokio::test]
    async fn immediate_admissions_never_touch_the_clock() {
        let clock = TestClock::new();
        let config = LimiterConfig::new(2.0, 1.0);
        let limiter = TokenBucketLimiter::with_config(config, clock.clone()).unwrap();

        clock.fail_next_sleep();
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        // the armed failure is only hit once a wait is needed
        assert!(limiter.acquire().await.is_err());
        limiter.acquire().await.unwrap();
    }

    #[test]
    fn missing_runtime_is_reported_not_created() {
        let limiter = TokenBucketLimiter::new(1.0, 1.0).unwrap();

        // a full bucket needs no timer
        assert!(matches!(poll_once(limiter.acquire()), Poll::Ready(Ok(()))));

        // an empty one does, and there is no runtime to provide it
        match poll_once(limiter.acquire()) {
            Poll::Ready(Err(LimiterError::SchedulingFailure(ClockError::NoRuntime))) => {}
            other => panic!("Expected NoRuntime, got: {:?}", other),
        }
    }

    #[test]
    fn injected_handle_schedules_outside_the_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_time()
            .build()
            .unwrap();
        let clock = TokioClock::with_handle(runtime.handle().clone());
        assert!(clock.handle().is_some());

        let config = LimiterConfig::new(1.0, 1.0);
        let limiter = TokenBucketLimiter::with_config(config, clock).unwrap();

        assert!(matches!(poll_once(limiter.acquire()), Poll::Ready(Ok(()))));
        // the timer is registered on the injected runtime, so the caller just waits
        assert!(poll_once(limiter.acquire()).is_pending());
    }

    #[test]
    fn injected_handle_drives_acquire_to_completion() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let handle = runtime.handle().clone();

        runtime.block_on(async move {
            let config = LimiterConfig::new(1.0, 2.0);
            let limiter =
                TokenBucketLimiter::with_config(config, TokioClock::with_handle(handle)).unwrap();
            let start = tokio::time::Instant::now();
            limiter.acquire().await.unwrap();
            limiter.acquire().await.unwrap();
            assert!(start.elapsed() >= std::time::Duration::from_millis(500));
        });
    }

    #[test]
    fn config_validation_errors_still_work() {
        let clock = TestClock::new();

        // Test invalid rate
        let config = LimiterConfig::new(5.0, 0.0);
        match TokenBucketLimiter::with_config(config, clock.clone()) {
            Err(LimiterError::InvalidConfiguration(ConfigError::InvalidRate(_))) => {} // Expected
            other => panic!("Expected InvalidRate, got: {:?}", other.map(|_| ())),
        }

        // Test invalid capacity
        let config = LimiterConfig::new(0.5, 10.0);
        match KeyedLimiter::<String, _>::with_config(config, clock) {
            Err(LimiterError::InvalidConfiguration(ConfigError::InvalidCapacity(_))) => {} // Expected
            other => panic!("Expected InvalidCapacity, got: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn error_display_formatting() {
        let error = LimiterError::from(ConfigError::InvalidRate(-2.0));
        let message = error.to_string();
        assert!(message.contains("rate"));
        assert!(message.contains("-2"));

        let error = LimiterError::from(ClockError::NoRuntime);
        let message = error.to_string().to_lowercase();
        assert!(message.contains("scheduling"));
        assert!(message.contains("runtime"));
    }

    #[test]
    fn runtime_without_timers_is_reported_not_panicked() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();

        runtime.block_on(async {
            let limiter = TokenBucketLimiter::new(1.0, 1.0).unwrap();
            limiter.acquire().await.unwrap();

            match limiter.acquire().await {
                Err(LimiterError::SchedulingFailure(ClockError::TimerDisabled)) => {} // Expected
                other => panic!("Expected TimerDisabled, got: {:?}", other),
            }

            // the bucket was released and nothing was taken
            assert!(limiter.available_tokens().await < 1.0);
        });
    }

    #[test]
    fn shut_down_handle_never_admits_a_waiting_caller() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let clock = TokioClock::with_handle(runtime.handle().clone());
        let limiter = TokenBucketLimiter::with_config(LimiterConfig::new(1.0, 1.0), clock).unwrap();
        assert!(matches!(poll_once(limiter.acquire()), Poll::Ready(Ok(()))));

        // the handle's runtime must outlive the limiter; once it is gone a wait cannot succeed
        drop(runtime);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| poll_once(limiter.acquire())));
        assert!(!matches!(outcome, Ok(Poll::Ready(Ok(())))));
    }

    #[test]
    fn injected_handle_also_supplies_the_time() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .start_paused(true)
            .build()
            .unwrap();
        let clock = TokioClock::with_handle(runtime.handle().clone());

        // read from outside the runtime, yet it follows the runtime's paused clock
        let before = clock.now();
        runtime.block_on(tokio::time::advance(Duration::from_secs(10)));
        let after = clock.now();

        assert!(after.duration_since(before) >= Duration::from_secs(10));
    }
}
