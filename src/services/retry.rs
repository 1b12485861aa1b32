//! Exponential backoff for infrastructure-failure retries around pipeline
//! invocations, per spec's Open-Question decision to reuse the provider
//! retry shape for store failures.

use crate::domain::models::config::RetryConfig;

/// Computes the backoff duration in milliseconds for the given retry
/// attempt (0-indexed), doubling from `initial_backoff_ms` and capped at
/// `max_backoff_ms`.
pub fn backoff_ms(config: &RetryConfig, attempt: u32) -> u64 {
    let doubled = config.initial_backoff_ms.saturating_mul(1u64 << attempt.min(32));
    doubled.min(config.max_backoff_ms)
}
