// biovalidate-cache-sqlite/src/entry.rs
// ============================================================================
// Module: Cache Entry
// Description: One stored resolution of a (organism, identifier) pair.
// Purpose: Carry a resolved answer plus its expiry for TTL enforcement.
// Dependencies: biovalidate-core, serde
// ============================================================================

//! ## Overview
//! A [`CacheEntry`] is written once a provider (or an earlier cache hit)
//! resolves an identifier. Degraded outcomes are never stored — see
//! `biovalidate-lookup`'s write-back step — so every entry here represents
//! a confirmed identifier, an affirmative "not found", or a cached ambiguity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use biovalidate_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// What a provider concluded about an identifier, as stored in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheResolution {
    /// The identifier was confirmed.
    Valid,
    /// The identifier was affirmatively reported absent.
    NotFound,
    /// The provider matched more than one candidate.
    Ambiguous {
        /// Number of candidate matches the provider returned.
        candidate_count: usize,
    },
}

// ============================================================================
// SECTION: Entry
// ============================================================================

/// A durable resolution stored against one [`crate::key::CacheKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// What the provider concluded.
    pub resolution: CacheResolution,
    /// Canonical name reported by the provider, if any.
    pub canonical_name: Option<String>,
    /// Name of the provider that produced this resolution (`"primary"`, `"secondary"`).
    pub provider: String,
    /// When this entry was written.
    pub stored_at: Timestamp,
    /// When this entry should be treated as stale.
    pub expires_at: Timestamp,
}

impl CacheEntry {
    /// True when `now` is at or past this entry's expiry.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now.as_offset_date_time() >= self.expires_at.as_offset_date_time()
    }
}

#[cfg(test)]
mod tests {
    use time::Duration as TimeDuration;

    use super::*;

    fn entry_expiring_in(seconds: i64) -> CacheEntry {
        let now = Timestamp::now();
        CacheEntry {
            resolution: CacheResolution::Valid,
            canonical_name: Some("TP53".to_string()),
            provider: "primary".to_string(),
            stored_at: now,
            expires_at: Timestamp::from_offset_date_time(
                now.as_offset_date_time() + TimeDuration::seconds(seconds),
            ),
        }
    }

    #[test]
    fn not_expired_before_expiry() {
        let entry = entry_expiring_in(60);
        assert!(!entry.is_expired(Timestamp::now()));
    }

    #[test]
    fn expired_after_expiry() {
        let entry = entry_expiring_in(-1);
        assert!(entry.is_expired(Timestamp::now()));
    }
}
