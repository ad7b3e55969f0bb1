// biovalidate-providers/src/retry.rs
// ============================================================================
// Module: Retry With Exponential Backoff
// Description: Generic retry helper for transient provider failures.
// Purpose: Share one backoff policy between the primary and secondary clients.
// Dependencies: crate::error, tokio
// ============================================================================

//! ## Overview
//! [`retry_with_backoff`] retries an async operation while
//! [`crate::error::ProviderError::is_retryable`] holds, sleeping with
//! exponential backoff between attempts. A non-retryable error, or the final
//! attempt, is returned immediately to the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

// ============================================================================
// SECTION: Backoff Policy
// ============================================================================

/// Exponential backoff policy shared by both provider clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries, regardless of attempt count.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self { max_attempts: 4, base_delay: Duration::from_millis(500), max_delay: Duration::from_secs(8) }
    }
}

impl BackoffPolicy {
    /// Returns the delay to sleep before the given zero-indexed retry attempt.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base_delay.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        scaled.min(self.max_delay)
    }
}

// ============================================================================
// SECTION: Retry Loop
// ============================================================================

/// Retries `operation` under `policy` until it succeeds, exhausts its
/// attempts, or fails with a non-retryable [`ProviderError`].
///
/// # Errors
///
/// Returns the last [`ProviderError`] observed once attempts are exhausted or
/// the error is not retryable.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: BackoffPolicy,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt + 1 < policy.max_attempts => {
                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn delay_grows_exponentially_and_is_capped() {
        let policy = BackoffPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicU32::new(0);
        let policy = BackoffPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let result = retry_with_backoff(policy, || {
            let count = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 { Err(ProviderError::Timeout) } else { Ok(42) }
            }
        })
        .await;
        assert_eq!(result.expect("should eventually succeed"), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_error_returns_immediately() {
        let attempts = AtomicU32::new(0);
        let policy = BackoffPolicy::default();
        let result: Result<(), ProviderError> = retry_with_backoff(policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Decode("bad".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_attempts_then_returns_last_error() {
        let attempts = AtomicU32::new(0);
        let policy = BackoffPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        };
        let result: Result<(), ProviderError> = retry_with_backoff(policy, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Timeout) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
