//! Token bucket rate limiter gating external-queue dispatch throughput.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

/// Implements the token bucket algorithm: tokens are refilled continuously
/// based on elapsed time, and `acquire` waits until at least one token is
/// available before consuming it.
pub struct TokenBucketRateLimiter {
    tokens: Arc<Mutex<f64>>,
    capacity: f64,
    refill_rate: f64,
    last_refill: Arc<Mutex<Instant>>,
}

impl TokenBucketRateLimiter {
    /// Creates a limiter with burst capacity equal to its sustained rate.
    ///
    /// # Panics
    /// Panics if `dispatches_per_second` is zero.
    pub fn new(dispatches_per_second: u32) -> Self {
        assert!(dispatches_per_second > 0, "dispatches_per_second must be positive");
        let rate = f64::from(dispatches_per_second);
        Self { tokens: Arc::new(Mutex::new(rate)), capacity: rate, refill_rate: rate, last_refill: Arc::new(Mutex::new(Instant::now())) }
    }

    pub async fn acquire(&self) {
        loop {
            let mut tokens = self.tokens.lock().await;
            let mut last_refill = self.last_refill.lock().await;

            let now = Instant::now();
            let elapsed = now.duration_since(*last_refill).as_secs_f64();
            let refilled = (*tokens + elapsed * self.refill_rate).min(self.capacity);

            if refilled >= 1.0 {
                *tokens = refilled - 1.0;
                *last_refill = now;
                return;
            }

            let wait_secs = (1.0 - refilled) / self.refill_rate;
            drop(tokens);
            drop(last_refill);
            sleep(Duration::from_secs_f64(wait_secs)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bursts_up_to_capacity_immediately() {
        let limiter = TokenBucketRateLimiter::new(5);
        for _ in 0..5 {
            let start = Instant::now();
            limiter.acquire().await;
            assert!(start.elapsed() < Duration::from_millis(50));
        }
    }

    #[tokio::test]
    async fn blocks_once_capacity_is_exhausted() {
        let limiter = TokenBucketRateLimiter::new(2);
        limiter.acquire().await;
        limiter.acquire().await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(400));
    }
}
