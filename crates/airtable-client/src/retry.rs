//! Bounded fixed-delay retry.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Default number of attempts per request (first try included)
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default delay between attempts
const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// How often and how patiently a failing operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Fixed wait between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Same attempt count, no waiting between attempts.
    pub fn without_delay(self) -> Self {
        Self {
            delay: Duration::ZERO,
            ..self
        }
    }

    /// Runs `operation` until it succeeds or the attempts are used up.
    ///
    /// The closure receives the 1-based attempt number. The last error is
    /// returned unchanged once no attempts remain.
    pub async fn run<F, Fut, T, E>(&self, what: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!("{} succeeded after {} attempts", what, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if attempt < max_attempts => {
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}...",
                        what,
                        attempt,
                        max_attempts,
                        e,
                        self.delay
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("{} failed after {} attempts: {}", what, attempt, e);
                    return Err(e);
                }
            }
        }
    }
}
