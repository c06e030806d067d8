use std::future::Future;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::client::ApiError;

/// Bounded retry for upstream calls.
///
/// Only errors for which [`ApiError::is_retryable`] holds are retried. The
/// wait before each retry grows by 1.5x from `period` and never exceeds
/// `max_period`. When the error carries a retry-after instant, the wait is
/// the time left until then, still capped at `max_period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub period: Duration,
    pub max_period: Duration,
    /// Total attempts, including the first one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(100),
            max_period: Duration::from_secs(1),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes a single attempt.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait after the given 1-based attempt failed without a retry-after hint.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let nanos = self.period.as_nanos() as f64 * 1.5f64.powi(exponent);
        Duration::from_nanos(nanos.min(self.max_period.as_nanos() as f64) as u64)
    }

    fn delay_for(&self, attempt: u32, err: &ApiError) -> Duration {
        match err.retry_after() {
            Some(at) => at
                .saturating_duration_since(Instant::now())
                .min(self.max_period),
            None => self.backoff(attempt),
        }
    }

    /// Run `call` until it succeeds, fails terminally, or the attempt budget
    /// is spent. The last error is returned on exhaustion.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt, &e);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "upstream call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(operation, attempts = attempt, error = %e, "retry budget exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}
