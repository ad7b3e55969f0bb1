// biovalidate-lookup/src/config.rs
// ============================================================================
// Module: Lookup Subsystem Configuration
// Description: Tunables for batching, caching, and provider concurrency.
// Purpose: Give the host one place to wire environment-derived settings into
//          the lookup subsystem without this crate depending on
//          biovalidate-config directly.
// Dependencies: none beyond std
// ============================================================================

//! ## Overview
//! Every field here has the same default the spec documents when the host
//! does not override it. The host is expected to build this from
//! `biovalidate_config::EnvConfig` (or an equivalent) and pass it to
//! [`crate::subsystem::LookupSubsystem::new`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Tunables controlling how the lookup subsystem batches, caches, and rate
/// limits external identifier resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupSubsystemConfig {
    /// Maximum identifiers submitted to the primary provider in one request.
    pub batch_size: usize,
    /// Entry lifetime written on every successful cache write-back.
    pub cache_ttl: Duration,
    /// Whether the persistent cache is consulted at all.
    pub cache_enabled: bool,
    /// Whether the secondary provider is eligible for failover.
    pub secondary_enabled: bool,
    /// Primary provider token-bucket refill rate, requests per second.
    pub primary_rate_limit_per_sec: f64,
    /// Secondary provider token-bucket refill rate, requests per second.
    pub secondary_rate_limit_per_sec: f64,
    /// Maximum concurrent in-flight requests to the primary provider.
    pub primary_concurrency_cap: usize,
    /// Maximum concurrent in-flight requests to the secondary provider.
    pub secondary_concurrency_cap: usize,
}

impl Default for LookupSubsystemConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            cache_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            cache_enabled: true,
            secondary_enabled: true,
            primary_rate_limit_per_sec: 3.0,
            secondary_rate_limit_per_sec: 15.0,
            primary_concurrency_cap: 8,
            secondary_concurrency_cap: 8,
        }
    }
}

impl LookupSubsystemConfig {
    /// Cache TTL expressed in whole hours, for [`biovalidate_core::ApiConfiguration`].
    #[must_use]
    pub fn cache_ttl_hours(&self) -> u64 {
        self.cache_ttl.as_secs() / 3_600
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_values() {
        let config = LookupSubsystemConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.cache_ttl_hours(), 168);
        assert_eq!(config.primary_concurrency_cap, 8);
    }
}
