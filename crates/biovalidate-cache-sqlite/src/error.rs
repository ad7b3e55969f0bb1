// biovalidate-cache-sqlite/src/error.rs
// ============================================================================
// Module: Cache Error Taxonomy
// Description: Failure modes of the SQLite-backed lookup cache.
// Purpose: Let callers distinguish "cache unavailable" from "cache miss".
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! A [`CacheError`] means the store itself could not be used, not that a key
//! was absent — an absent key is simply `Ok(None)` from
//! [`crate::store::SqliteCache::get`]. `biovalidate-lookup` maps a
//! [`CacheError`] to `biovalidate_core::LookupError::CacheUnavailable`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors the SQLite-backed cache can raise.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store path could not be created, opened, or written to.
    #[error("cache i/o error: {0}")]
    Io(String),
    /// A SQL statement failed against an otherwise-healthy connection.
    #[error("cache database error: {0}")]
    Db(String),
    /// The store file failed its integrity check and could not be recovered.
    #[error("cache store is corrupt and could not be recreated: {0}")]
    Corrupt(String),
    /// A stored row could not be decoded back into a [`crate::entry::CacheEntry`].
    #[error("cache entry decode error: {0}")]
    Decode(String),
    /// The internal connection mutex was poisoned by a panicking holder.
    #[error("cache connection lock poisoned")]
    Poisoned,
}
