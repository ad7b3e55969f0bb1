// biovalidate-cache-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Lookup Cache
// Description: Durable TTL cache for external identifier resolutions.
// Purpose: Collapse repeat provider calls across runs for the lookup subsystem.
// Dependencies: biovalidate-core, rusqlite, tokio, crate::{entry, error, key, stats}
// ============================================================================

//! ## Overview
//! [`SqliteCache`] is the only durable store the lookup subsystem touches. One
//! connection is guarded by a [`tokio::sync::Mutex`] so concurrent callers
//! within a run serialize on it rather than racing `rusqlite`, which is not
//! `Sync`. Corruption is detected at [`SqliteCache::open`] via
//! `PRAGMA integrity_check`; an unreadable store is deleted and recreated
//! empty rather than failing the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use biovalidate_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tokio::sync::Mutex;

use crate::entry::CacheEntry;
use crate::entry::CacheResolution;
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::stats::CacheCounters;
use crate::stats::CacheStats;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`SqliteCache::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// File path of the store. A missing parent directory is created.
    pub path: PathBuf,
    /// How long a connection waits for a lock held by another process.
    pub busy_timeout: Duration,
}

impl CacheConfig {
    /// Builds a config pointing at `path` with the default busy timeout.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout: Duration::from_millis(5_000) }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// SQLite-backed TTL cache of external identifier resolutions.
pub struct SqliteCache {
    /// Guarded connection; `rusqlite::Connection` is not `Sync`.
    connection: Mutex<Connection>,
    /// In-memory hit/miss/write/eviction counters for [`SqliteCache::stats`].
    counters: CacheCounters,
}

impl SqliteCache {
    /// Opens (creating if absent) the cache store at `config.path`.
    ///
    /// If the existing file fails its integrity check, it is deleted and
    /// recreated empty — a corrupt cache degrades to "always miss", not to a
    /// run failure.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] when the parent directory cannot be
    /// created, or [`CacheError::Corrupt`] when the store cannot be opened
    /// even after attempting to recreate it.
    pub fn open(config: &CacheConfig) -> Result<Self, CacheError> {
        ensure_parent_dir(&config.path)?;
        let connection = match open_connection(&config.path, config.busy_timeout) {
            Ok(connection) => connection,
            Err(_) => recreate_store(&config.path, config.busy_timeout)?,
        };
        Ok(Self { connection: Mutex::new(connection), counters: CacheCounters::default() })
    }

    /// Looks up `key`, returning `None` on a miss or an expired entry.
    ///
    /// An expired entry found during a lookup is counted as a miss and left
    /// in place; [`SqliteCache::clear_expired`] is responsible for eviction.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the query itself fails or a stored row
    /// cannot be decoded.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let connection = self.connection.lock().await;
        let row: Option<(String, Option<i64>, Option<String>, String, String, String)> = connection
            .query_row(
                "SELECT resolution, candidate_count, canonical_name, provider, stored_at, expires_at \
                 FROM cache_entries WHERE organism = ?1 AND identifier = ?2",
                params![key.organism(), key.identifier()],
                |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                },
            )
            .optional()
            .map_err(|err| CacheError::Db(err.to_string()))?;

        let Some((resolution, candidate_count, canonical_name, provider, stored_at, expires_at)) = row
        else {
            self.counters.record_miss();
            return Ok(None);
        };
        let entry = CacheEntry {
            resolution: decode_resolution(&resolution, candidate_count)?,
            canonical_name,
            provider,
            stored_at: parse_timestamp(&stored_at)?,
            expires_at: parse_timestamp(&expires_at)?,
        };
        if entry.is_expired(Timestamp::now()) {
            self.counters.record_miss();
            return Ok(None);
        }
        self.counters.record_hit();
        Ok(Some(entry))
    }

    /// Writes (or overwrites) the entry stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Db`] when the insert fails.
    pub async fn put(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        let (resolution, candidate_count) = encode_resolution(entry.resolution);
        let connection = self.connection.lock().await;
        connection
            .execute(
                "INSERT INTO cache_entries \
                    (organism, identifier, resolution, candidate_count, canonical_name, provider, \
                     stored_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
                 ON CONFLICT(organism, identifier) DO UPDATE SET \
                    resolution = excluded.resolution, \
                    candidate_count = excluded.candidate_count, \
                    canonical_name = excluded.canonical_name, \
                    provider = excluded.provider, \
                    stored_at = excluded.stored_at, \
                    expires_at = excluded.expires_at",
                params![
                    key.organism(),
                    key.identifier(),
                    resolution,
                    candidate_count,
                    entry.canonical_name,
                    entry.provider,
                    entry.stored_at.to_string(),
                    entry.expires_at.to_string(),
                ],
            )
            .map_err(|err| CacheError::Db(err.to_string()))?;
        self.counters.record_write();
        Ok(())
    }

    /// Deletes every entry whose `expires_at` is at or before now.
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Db`] when the delete fails.
    pub async fn clear_expired(&self) -> Result<u64, CacheError> {
        let connection = self.connection.lock().await;
        let now = Timestamp::now().to_string();
        let removed = connection
            .execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])
            .map_err(|err| CacheError::Db(err.to_string()))?;
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        self.counters.record_evictions(removed);
        Ok(removed)
    }

    /// Deletes every entry, expired or not. Used by the cache-management API.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Db`] when the delete fails.
    pub async fn purge(&self) -> Result<u64, CacheError> {
        let connection = self.connection.lock().await;
        let removed = connection
            .execute("DELETE FROM cache_entries", params![])
            .map_err(|err| CacheError::Db(err.to_string()))?;
        let removed = u64::try_from(removed).unwrap_or(u64::MAX);
        self.counters.record_evictions(removed);
        Ok(removed)
    }

    /// Returns hit/miss/write/eviction counters plus a live row count and
    /// approximate on-disk size.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Db`] when the underlying queries fail.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let connection = self.connection.lock().await;
        let now = Timestamp::now().to_string();
        let live_entries: i64 = connection
            .query_row("SELECT COUNT(1) FROM cache_entries WHERE expires_at > ?1", params![now], |row| {
                row.get(0)
            })
            .map_err(|err| CacheError::Db(err.to_string()))?;
        let page_count: i64 = connection
            .query_row("PRAGMA page_count", params![], |row| row.get(0))
            .map_err(|err| CacheError::Db(err.to_string()))?;
        let page_size: i64 = connection
            .query_row("PRAGMA page_size", params![], |row| row.get(0))
            .map_err(|err| CacheError::Db(err.to_string()))?;
        let byte_size = u64::try_from(page_count.saturating_mul(page_size)).unwrap_or(0);
        let live_entries = u64::try_from(live_entries).unwrap_or(0);
        Ok(self.counters.snapshot(byte_size, live_entries))
    }
}

// ============================================================================
// SECTION: Connection Setup
// ============================================================================

/// Creates `path`'s parent directory, if any, when it does not yet exist.
fn ensure_parent_dir(path: &Path) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|err| CacheError::Io(err.to_string()))?;
        }
    }
    Ok(())
}

/// Opens `path`, applies pragmas, checks integrity, and ensures the schema exists.
fn open_connection(path: &Path, busy_timeout: Duration) -> Result<Connection, CacheError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags).map_err(|err| CacheError::Db(err.to_string()))?;
    apply_pragmas(&connection, busy_timeout)?;
    check_integrity(&connection)?;
    initialize_schema(&connection)?;
    Ok(connection)
}

/// Enables WAL journaling, normal synchronous mode, and the given busy timeout.
fn apply_pragmas(connection: &Connection, busy_timeout: Duration) -> Result<(), CacheError> {
    connection
        .execute_batch("PRAGMA journal_mode = wal; PRAGMA synchronous = normal;")
        .map_err(|err| CacheError::Db(err.to_string()))?;
    connection.busy_timeout(busy_timeout).map_err(|err| CacheError::Db(err.to_string()))?;
    Ok(())
}

/// Runs `PRAGMA integrity_check`, returning [`CacheError::Corrupt`] on anything but `"ok"`.
fn check_integrity(connection: &Connection) -> Result<(), CacheError> {
    let report: String = connection
        .query_row("PRAGMA integrity_check", params![], |row| row.get(0))
        .map_err(|err| CacheError::Corrupt(err.to_string()))?;
    if report == "ok" { Ok(()) } else { Err(CacheError::Corrupt(report)) }
}

/// Creates the `cache_entries` table and its expiry index if they do not exist.
fn initialize_schema(connection: &Connection) -> Result<(), CacheError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                organism TEXT NOT NULL,
                identifier TEXT NOT NULL,
                resolution TEXT NOT NULL,
                candidate_count INTEGER,
                canonical_name TEXT,
                provider TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                PRIMARY KEY (organism, identifier)
            );
            CREATE INDEX IF NOT EXISTS idx_cache_entries_expires_at
                ON cache_entries (expires_at);",
        )
        .map_err(|err| CacheError::Db(err.to_string()))
}

/// Deletes an unreadable store file and opens a fresh one in its place.
fn recreate_store(path: &Path, busy_timeout: Duration) -> Result<Connection, CacheError> {
    if path.exists() {
        std::fs::remove_file(path).map_err(|err| CacheError::Io(err.to_string()))?;
        let wal = path.with_extension("db-wal");
        let shm = path.with_extension("db-shm");
        let _ = std::fs::remove_file(wal);
        let _ = std::fs::remove_file(shm);
    }
    open_connection(path, busy_timeout)
}

/// Splits a [`CacheResolution`] into its stored `(resolution, candidate_count)` columns.
fn encode_resolution(resolution: CacheResolution) -> (&'static str, Option<i64>) {
    match resolution {
        CacheResolution::Valid => ("valid", None),
        CacheResolution::NotFound => ("not_found", None),
        CacheResolution::Ambiguous { candidate_count } => {
            ("ambiguous", Some(i64::try_from(candidate_count).unwrap_or(i64::MAX)))
        }
    }
}

/// Reassembles a [`CacheResolution`] from its stored `(resolution, candidate_count)` columns.
fn decode_resolution(raw: &str, candidate_count: Option<i64>) -> Result<CacheResolution, CacheError> {
    match raw {
        "valid" => Ok(CacheResolution::Valid),
        "not_found" => Ok(CacheResolution::NotFound),
        "ambiguous" => {
            let candidate_count = candidate_count.unwrap_or(0);
            Ok(CacheResolution::Ambiguous {
                candidate_count: usize::try_from(candidate_count).unwrap_or(0),
            })
        }
        other => Err(CacheError::Decode(format!("unrecognized cache resolution {other:?}"))),
    }
}

/// Parses an RFC 3339 timestamp string stored in a cache row.
fn parse_timestamp(raw: &str) -> Result<Timestamp, CacheError> {
    let parsed = time::OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339)
        .map_err(|err| CacheError::Decode(err.to_string()))?;
    Ok(Timestamp::from_offset_date_time(parsed))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use time::Duration as TimeDuration;

    use super::*;

    fn entry(valid: bool, ttl_seconds: i64) -> CacheEntry {
        let now = Timestamp::now();
        CacheEntry {
            resolution: if valid { CacheResolution::Valid } else { CacheResolution::NotFound },
            canonical_name: if valid { Some("TP53".to_string()) } else { None },
            provider: "primary".to_string(),
            stored_at: now,
            expires_at: Timestamp::from_offset_date_time(
                now.as_offset_date_time() + TimeDuration::seconds(ttl_seconds),
            ),
        }
    }

    async fn open_temp() -> (SqliteCache, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CacheConfig::new(dir.path().join("cache.db"));
        let cache = SqliteCache::open(&config).expect("open");
        (cache, dir)
    }

    #[tokio::test]
    async fn round_trips_an_entry() {
        let (cache, _dir) = open_temp().await;
        let key = CacheKey::new("human", "TP53");
        cache.put(&key, &entry(true, 3_600)).await.expect("put");
        let found = cache.get(&key).await.expect("get").expect("present");
        assert_eq!(found.resolution, CacheResolution::Valid);
        assert_eq!(found.canonical_name.as_deref(), Some("TP53"));
    }

    #[tokio::test]
    async fn miss_on_absent_key_and_on_expired_entry() {
        let (cache, _dir) = open_temp().await;
        let absent = CacheKey::new("human", "nope");
        assert!(cache.get(&absent).await.expect("get").is_none());

        let expired_key = CacheKey::new("human", "old");
        cache.put(&expired_key, &entry(true, -1)).await.expect("put");
        assert!(cache.get(&expired_key).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn clear_expired_removes_only_stale_rows() {
        let (cache, _dir) = open_temp().await;
        let fresh = CacheKey::new("human", "fresh");
        let stale = CacheKey::new("human", "stale");
        cache.put(&fresh, &entry(true, 3_600)).await.expect("put fresh");
        cache.put(&stale, &entry(true, -1)).await.expect("put stale");

        let removed = cache.clear_expired().await.expect("clear");
        assert_eq!(removed, 1);
        assert!(cache.get(&fresh).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn purge_removes_everything() {
        let (cache, _dir) = open_temp().await;
        cache.put(&CacheKey::new("human", "a"), &entry(true, 3_600)).await.expect("put");
        cache.put(&CacheKey::new("human", "b"), &entry(true, 3_600)).await.expect("put");

        let removed = cache.purge().await.expect("purge");
        assert_eq!(removed, 2);
        let stats = cache.stats().await.expect("stats");
        assert_eq!(stats.live_entries, 0);
    }

    #[tokio::test]
    async fn stats_report_hits_and_misses() {
        let (cache, _dir) = open_temp().await;
        let key = CacheKey::new("human", "TP53");
        cache.put(&key, &entry(true, 3_600)).await.expect("put");
        let _ = cache.get(&key).await.expect("get");
        let _ = cache.get(&CacheKey::new("human", "missing")).await.expect("get");

        let stats = cache.stats().await.expect("stats");
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
    }

    #[test]
    fn recreates_a_corrupt_store_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cache.db");
        std::fs::write(&path, b"not a sqlite database").expect("write garbage");
        let config = CacheConfig::new(&path);
        let cache = SqliteCache::open(&config);
        assert!(cache.is_ok());
    }
}
