//! Bounded retry with exponential backoff for rate-limited requests.
//!
//! Only [`Error::RateLimited`] is retried. Every other error, including other
//! non-success statuses, is returned on the first occurrence.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// How many times, and how patiently, a rate-limited request is retried.
///
/// The delay before retry `n` (1-based) is `base_delay * 2^(n-1)`, raised to the
/// server's `Retry-After` hint when one was given, and capped at `max_delay`.
///
/// # Examples
///
/// ```rust
/// use shirabe::net::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3).with_base_delay(Duration::from_millis(500));
/// assert_eq!(policy.delay_for(1, None), Duration::from_millis(500));
/// assert_eq!(policy.delay_for(3, None), Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay before the given retry.
    pub fn delay_for(&self, retry: u32, retry_after: Option<u64>) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let backoff = self.base_delay.saturating_mul(factor);
        let hinted = retry_after.map(Duration::from_secs).unwrap_or_default();

        backoff.max(hinted).min(self.max_delay)
    }

    /// Runs `operation`, retrying while it reports [`Error::RateLimited`].
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimitExceeded`] - If the last allowed attempt was rate limited
    /// * Any other error from `operation`, unchanged
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retries = 0;

        loop {
            match operation().await {
                Err(Error::RateLimited { retry_after }) => {
                    if retries >= self.max_retries {
                        tracing::warn!(attempts = retries + 1, "rate limit retries exhausted");
                        return Err(Error::RateLimitExceeded {
                            attempts: retries + 1,
                            retry_after,
                        });
                    }

                    retries += 1;
                    let delay = self.delay_for(retries, retry_after);
                    tracing::warn!(retry = retries, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}
