// biovalidate-providers/src/error.rs
// ============================================================================
// Module: Provider Error Taxonomy
// Description: Failure modes an identifier provider client can raise.
// Purpose: Distinguish transient (retryable) failures from permanent ones.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Providers never synthesize `Issue`s themselves; a provider error is handed
//! back up to the lookup subsystem, which decides whether to retry, fail
//! over, or surface a `degraded` outcome. [`ProviderError::is_retryable`]
//! is the single source of truth the retry/backoff loop consults.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors an [`crate::client::IdentifierLookupClient`] may return.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The underlying transport failed (DNS, connect, read).
    #[error("provider network error: {0}")]
    Network(String),
    /// The provider returned a non-success HTTP status.
    #[error("provider returned http status {status}")]
    HttpStatus {
        /// HTTP status code returned by the provider.
        status: u16,
    },
    /// The provider explicitly signaled it is rate-limiting the caller
    /// (HTTP 429 or an equivalent payload flag).
    #[error("provider signaled rate limiting")]
    RateLimited,
    /// The request did not complete before its per-call timeout.
    #[error("provider request timed out")]
    Timeout,
    /// The response body could not be decoded into the expected shape.
    #[error("provider response decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Returns true when retrying the same request has a reasonable chance
    /// of succeeding: network failures, 5xx statuses, explicit rate-limit
    /// signals, and timeouts. Decode errors and non-5xx client errors are
    /// not retried since the response itself will not change.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimited | Self::Timeout => true,
            Self::HttpStatus { status } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        assert!(ProviderError::HttpStatus { status: 503 }.is_retryable());
    }

    #[test]
    fn client_errors_are_not_retryable() {
        assert!(!ProviderError::HttpStatus { status: 404 }.is_retryable());
    }

    #[test]
    fn decode_errors_are_not_retryable() {
        assert!(!ProviderError::Decode("bad json".to_string()).is_retryable());
    }

    #[test]
    fn transient_classes_are_retryable() {
        assert!(ProviderError::Network("reset".to_string()).is_retryable());
        assert!(ProviderError::RateLimited.is_retryable());
        assert!(ProviderError::Timeout.is_retryable());
    }
}
