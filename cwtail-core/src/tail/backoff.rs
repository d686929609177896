//! Capped exponential backoff.
//!
//! Two policies use it:
//!
//! - throttling: per stream, unbounded, applied as a "not before" deadline on
//!   the stream's next fetch so other streams keep moving
//! - unavailability: retried inline a bounded number of times, after which the
//!   caller gives up on the stream

use crate::backend::BackendError;
use crate::tail::Clock;
use rand::{Rng, rng};
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// Retry attempts after the initial one. Ignored for throttling.
    pub max_retries: u32,

    pub initial_delay: Duration,

    /// Cap for exponential growth.
    pub max_delay: Duration,

    pub backoff_multiplier: f64,

    /// Fraction of each delay that may be randomly shaved off (0.0 to 1.0).
    pub jitter: f64,
}

impl BackoffConfig {
    pub const THROTTLE: Self = Self {
        max_retries: u32::MAX,
        initial_delay: Duration::from_millis(250),
        max_delay: Duration::from_secs(10),
        backoff_multiplier: 2.0,
        jitter: 0.1,
    };

    pub const UNAVAILABLE: Self = Self {
        max_retries: 3,
        initial_delay: Duration::from_millis(200),
        max_delay: Duration::from_secs(5),
        backoff_multiplier: 2.0,
        jitter: 0.0,
    };

    /// `initial_delay * backoff_multiplier^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.backoff_multiplier.powi(attempt.min(64) as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped_secs = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped_secs.max(0.0))
    }

    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let delay = self.delay_for_attempt(attempt);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return delay;
        }
        let shave = rng().random_range(0.0..jitter);
        delay.mul_f64(1.0 - shave)
    }
}

#[derive(Debug)]
pub enum RetryResult<T> {
    Success(T),

    /// Still failing with a retriable error after `attempts` tries.
    ExhaustedRetries { last_error: BackendError, attempts: u32 },

    /// Failed with an error the caller asked not to retry.
    NotRetried(BackendError),
}

impl<T> RetryResult<T> {
    pub fn into_result(self) -> Result<T, BackendError> {
        match self {
            RetryResult::Success(v) => Ok(v),
            RetryResult::ExhaustedRetries { last_error, .. } => Err(last_error),
            RetryResult::NotRetried(e) => Err(e),
        }
    }
}

pub fn is_unavailable(err: &BackendError) -> bool {
    matches!(err, BackendError::Unavailable { .. })
}

pub fn is_transient(err: &BackendError) -> bool {
    matches!(
        err,
        BackendError::Unavailable { .. } | BackendError::Throttled { .. }
    )
}

/// Runs `operation` until it succeeds, fails with a non-retriable error, or
/// runs out of retries. Waits go through `clock` so tests stay instant.
pub async fn retry_with_backoff<T, F, Fut>(
    config: &BackoffConfig,
    clock: &dyn Clock,
    retriable: fn(&BackendError) -> bool,
    mut operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) if !retriable(&e) => return RetryResult::NotRetried(e),
            Err(e) => {
                if attempt >= config.max_retries {
                    return RetryResult::ExhaustedRetries {
                        last_error: e,
                        attempts: attempt + 1,
                    };
                }

                let delay = config.jittered_delay(attempt);
                tracing::debug!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "retrying backend call"
                );
                clock.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
