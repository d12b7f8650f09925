//! Token bucket rate limiter shared by every outbound API call.
//!
//! One instance is created per run and handed (as `Arc<RateLimiter>`) to the
//! schema translator, every reader and every writer, so the ceiling applies
//! to the process as a whole rather than per table.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Airtable allows 5 requests per second per base.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Token bucket that blocks callers instead of rejecting them.
///
/// Tokens refill at a constant rate up to `max_per_second`. A caller that
/// finds the bucket empty reserves the next token anyway (the balance goes
/// negative) and sleeps until that token would have been refilled, so
/// concurrent callers queue up in admission order.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum calls per second. 0 = unlimited.
    max_per_second: u32,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    /// Available tokens; negative while callers are waiting.
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a limiter admitting at most `max_per_second` calls per second.
    ///
    /// A rate of 0 means unlimited.
    #[must_use]
    pub fn new(max_per_second: u32) -> Self {
        Self {
            max_per_second,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(max_per_second),
                last_refill: Instant::now(),
            }),
        }
    }

    /// A limiter that never waits.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn max_per_second(&self) -> u32 {
        self.max_per_second
    }

    /// Runs `operation` once admitted.
    ///
    /// The operation's result, including any error, is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        operation().await
    }

    /// Waits until one call may proceed.
    pub async fn acquire(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            tracing::trace!("Rate limit reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    /// Takes one token and returns how long the caller must wait for it.
    fn reserve(&self) -> Duration {
        if self.max_per_second == 0 {
            return Duration::ZERO;
        }
        let rate = f64::from(self.max_per_second);

        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * rate).min(rate);
        bucket.last_refill = now;
        bucket.tokens -= 1.0;

        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / rate)
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REQUESTS_PER_SECOND)
    }
}
