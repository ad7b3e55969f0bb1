// biovalidate-lookup/src/subsystem.rs
// ============================================================================
// Module: Lookup Subsystem
// Description: Composes the cache, primary/secondary providers, rate limiting,
//              and single-flight coalescing into one `BioLookupProvider`.
// Purpose: The sole implementation `biovalidate-core`'s orchestrator depends on
//          for external identifier validation.
// Dependencies: biovalidate-cache-sqlite, biovalidate-core, biovalidate-providers, tokio
// ============================================================================

//! ## Overview
//! [`LookupSubsystem::resolve_batch`] runs the seven-step pipeline: cache
//! lookup, miss coalescing into chunks, a batched primary-provider call under
//! its own rate limiter, per-identifier secondary failover for whatever the
//! primary could not resolve, degraded/ambiguous classification, and cache
//! write-back. A [`SingleFlight`] table keyed by [`CacheKey`] ensures two
//! overlapping calls for the same identifier never both reach the network.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use biovalidate_cache_sqlite::CacheEntry;
use biovalidate_cache_sqlite::CacheKey;
use biovalidate_cache_sqlite::CacheResolution;
use biovalidate_cache_sqlite::SqliteCache;
use biovalidate_core::ApiConfiguration;
use biovalidate_core::BioLookupProvider;
use biovalidate_core::IdentifierKind;
use biovalidate_core::LookupBatchResult;
use biovalidate_core::LookupError;
use biovalidate_core::LookupOutcome;
use biovalidate_core::LookupRequest;
use biovalidate_core::LookupStatus;
use biovalidate_core::Timestamp;
use biovalidate_providers::IdentifierLookupClient;
use biovalidate_providers::ProviderAnswer;
use biovalidate_providers::TokenBucket;
use tokio::sync::Semaphore;

use crate::config::LookupSubsystemConfig;
use crate::single_flight::Role;
use crate::single_flight::SingleFlight;

// ============================================================================
// SECTION: Shared Outcome
// ============================================================================

/// The value broadcast to single-flight followers once a leader resolves a key.
#[derive(Debug, Clone)]
enum SharedOutcome {
    /// A provider produced an answer.
    Resolved {
        /// The provider's answer.
        answer: ProviderAnswer,
        /// Which provider produced it (`"primary"` or `"secondary"`).
        source: &'static str,
    },
    /// No provider could resolve the identifier.
    Degraded {
        /// Human-readable reason, surfaced in stage metadata.
        message: String,
    },
}

// ============================================================================
// SECTION: Subsystem
// ============================================================================

/// Composes caching, rate-limited providers, and failover into one
/// [`BioLookupProvider`] implementation.
pub struct LookupSubsystem {
    /// Batching, caching, and rate-limit tunables.
    config: LookupSubsystemConfig,
    /// Persistent TTL cache, absent when caching is disabled entirely.
    cache: Option<SqliteCache>,
    /// Primary (batch-capable) identifier provider.
    primary: Arc<dyn IdentifierLookupClient>,
    /// Secondary failover provider, absent when no failover target is configured.
    secondary: Option<Arc<dyn IdentifierLookupClient>>,
    /// Rate limiter guarding calls to `primary`.
    primary_limiter: TokenBucket,
    /// Rate limiter guarding calls to `secondary`.
    secondary_limiter: TokenBucket,
    /// Concurrency cap on in-flight `primary` calls.
    primary_semaphore: Semaphore,
    /// Concurrency cap on in-flight `secondary` calls.
    secondary_semaphore: Semaphore,
    /// Coalesces concurrent resolutions of the same cache key.
    in_flight: SingleFlight<CacheKey, SharedOutcome>,
}

impl LookupSubsystem {
    /// Builds a lookup subsystem from its already-constructed collaborators.
    ///
    /// `cache` is `None` when the cache is disabled entirely (as opposed to
    /// `config.cache_enabled = false`, which also disables consultation but
    /// keeps a handle around for `cache.stats()`/management callers).
    #[must_use]
    pub fn new(
        config: LookupSubsystemConfig,
        cache: Option<SqliteCache>,
        primary: Arc<dyn IdentifierLookupClient>,
        secondary: Option<Arc<dyn IdentifierLookupClient>>,
    ) -> Self {
        let primary_limiter =
            TokenBucket::new(config.primary_rate_limit_per_sec, config.primary_rate_limit_per_sec.max(1.0));
        let secondary_limiter = TokenBucket::new(
            config.secondary_rate_limit_per_sec,
            config.secondary_rate_limit_per_sec.max(1.0),
        );
        let primary_semaphore = Semaphore::new(config.primary_concurrency_cap);
        let secondary_semaphore = Semaphore::new(config.secondary_concurrency_cap);
        Self {
            config,
            cache,
            primary,
            secondary,
            primary_limiter,
            secondary_limiter,
            primary_semaphore,
            secondary_semaphore,
            in_flight: SingleFlight::default(),
        }
    }

    /// Returns the expiry timestamp for an entry written at `now`.
    fn ttl_expiry(&self, now: Timestamp) -> Timestamp {
        now.plus(self.config.cache_ttl)
    }

    /// Writes `entry` under `key` when caching is configured and enabled,
    /// ignoring any write failure: a cache write-back never fails a run.
    async fn write_cache(&self, key: &CacheKey, entry: &CacheEntry) {
        if let Some(cache) = &self.cache {
            if self.config.cache_enabled {
                let _ = cache.put(key, entry).await;
            }
        }
    }

    /// Runs the primary provider for one chunk, obeying its rate limiter and
    /// concurrency cap.
    async fn call_primary(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
    ) -> Result<Vec<ProviderAnswer>, LookupError> {
        let _permit = self
            .primary_semaphore
            .acquire()
            .await
            .map_err(|_| LookupError::AllProvidersFailed("primary semaphore closed".to_string()))?;
        self.primary_limiter.acquire().await;
        self.primary
            .resolve(organism, kind, identifiers)
            .await
            .map_err(|err| LookupError::AllProvidersFailed(err.to_string()))
    }

    /// Runs the secondary provider for a single identifier.
    async fn call_secondary(
        &self,
        secondary: &Arc<dyn IdentifierLookupClient>,
        organism: &str,
        kind: IdentifierKind,
        identifier: &str,
    ) -> Option<ProviderAnswer> {
        let _permit = self.secondary_semaphore.acquire().await.ok()?;
        self.secondary_limiter.acquire().await;
        let identifiers = [identifier.to_string()];
        secondary.resolve(organism, kind, &identifiers).await.ok().and_then(|answers| answers.into_iter().next())
    }

    /// Resolves one miss-chunk: a primary call, then per-identifier secondary
    /// failover for whatever the primary could not produce.
    async fn resolve_chunk(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
        failovers: &mut usize,
    ) -> Vec<SharedOutcome> {
        match self.call_primary(organism, kind, identifiers).await {
            Ok(answers) if answers.len() == identifiers.len() => answers
                .into_iter()
                .map(|answer| SharedOutcome::Resolved { answer, source: "primary" })
                .collect(),
            _ => {
                let mut results = Vec::with_capacity(identifiers.len());
                for identifier in identifiers {
                    let resolved = match &self.secondary {
                        Some(secondary) if self.config.secondary_enabled => {
                            self.call_secondary(secondary, organism, kind, identifier).await
                        }
                        _ => None,
                    };
                    match resolved {
                        Some(answer) => {
                            *failovers += 1;
                            results.push(SharedOutcome::Resolved { answer, source: "secondary" });
                        }
                        None => results.push(SharedOutcome::Degraded {
                            message: "no provider could resolve this identifier".to_string(),
                        }),
                    }
                }
                results
            }
        }
    }
}

// ============================================================================
// SECTION: BioLookupProvider
// ============================================================================

#[async_trait]
impl BioLookupProvider for LookupSubsystem {
    async fn resolve_batch(&self, requests: &[LookupRequest]) -> Result<LookupBatchResult, LookupError> {
        if requests.is_empty() {
            return Ok(LookupBatchResult {
                outcomes: Vec::new(),
                cache_hits: 0,
                cache_misses: 0,
                failovers: 0,
                api_configuration: self.api_configuration(),
            });
        }

        let keys: Vec<CacheKey> =
            requests.iter().map(|request| CacheKey::new(&request.organism, &request.identifier)).collect();
        let mut outcomes: Vec<Option<LookupOutcome>> = vec![None; requests.len()];
        let mut cache_hits = 0usize;
        let mut cache_misses = 0usize;
        let mut failovers = 0usize;

        let mut miss_indices = Vec::new();
        for (index, request) in requests.iter().enumerate() {
            if self.config.cache_enabled {
                if let Some(cache) = &self.cache {
                    match cache.get(&keys[index]).await {
                        Ok(Some(entry)) => {
                            cache_hits += 1;
                            outcomes[index] = Some(outcome_from_cache_entry(request, &entry));
                            continue;
                        }
                        Ok(None) => {}
                        Err(err) => return Err(LookupError::CacheUnavailable(err.to_string())),
                    }
                }
            }
            cache_misses += 1;
            miss_indices.push(index);
        }

        let mut leader_indices = Vec::new();
        let mut follower_indices = Vec::new();
        let mut followers = Vec::new();
        for &index in &miss_indices {
            match self.in_flight.enter(keys[index].clone()).await {
                Role::Leader => leader_indices.push(index),
                Role::Follower(receiver) => {
                    follower_indices.push(index);
                    followers.push(receiver);
                }
            }
        }

        let now = Timestamp::now();

        let mut groups: BTreeMap<(String, &'static str), Vec<usize>> = BTreeMap::new();
        for &index in &leader_indices {
            let request = &requests[index];
            let group_key = (request.organism.to_lowercase(), kind_marker(request.kind));
            groups.entry(group_key).or_default().push(index);
        }

        for ((organism, _), indices) in groups {
            for chunk in indices.chunks(self.config.batch_size.max(1)) {
                let kind = requests[chunk[0]].kind;
                let identifiers: Vec<String> = chunk.iter().map(|&idx| requests[idx].identifier.clone()).collect();
                let resolved = self.resolve_chunk(&organism, kind, &identifiers, &mut failovers).await;

                for (position, &index) in chunk.iter().enumerate() {
                    let shared = resolved.get(position).cloned().unwrap_or(SharedOutcome::Degraded {
                        message: "provider returned fewer answers than requested".to_string(),
                    });
                    if let SharedOutcome::Resolved { answer, source } = &shared {
                        let entry = cache_entry_for(answer, source, now, self.ttl_expiry(now));
                        self.write_cache(&keys[index], &entry).await;
                    }
                    self.in_flight.publish(&keys[index], shared.clone()).await;
                    outcomes[index] = Some(outcome_from_shared(&requests[index], &shared));
                }
            }
        }

        for (position, index) in follower_indices.into_iter().enumerate() {
            let shared = match followers[position].recv().await {
                Ok(shared) => shared,
                Err(_) => SharedOutcome::Degraded {
                    message: "single-flight leader did not publish a result".to_string(),
                },
            };
            outcomes[index] = Some(outcome_from_shared(&requests[index], &shared));
        }

        Ok(LookupBatchResult {
            outcomes: finalize_outcomes(outcomes),
            cache_hits,
            cache_misses,
            failovers,
            api_configuration: self.api_configuration(),
        })
    }

    fn api_configuration(&self) -> ApiConfiguration {
        ApiConfiguration {
            cache_enabled: self.config.cache_enabled && self.cache.is_some(),
            secondary_provider_enabled: self.config.secondary_enabled && self.secondary.is_some(),
            primary_rate_limit_per_sec: self.config.primary_rate_limit_per_sec,
            secondary_rate_limit_per_sec: self.config.secondary_rate_limit_per_sec,
            cache_ttl_hours: self.config.cache_ttl_hours(),
        }
    }
}

impl LookupSubsystem {
    /// Pre-populates the cache for `pairs` without attaching the result to
    /// any validation run — the cache-management entry point a host calls
    /// out-of-band, e.g. ahead of a batch of runs expected to reference the
    /// same gene list. Runs the ordinary `resolve_batch` pipeline (cache
    /// phase, miss coalescing, failover, write-back) and discards the
    /// per-identifier outcomes, returning only the batch counters.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] under the same conditions as `resolve_batch`.
    pub async fn warm(
        &self,
        pairs: &[(String, String, IdentifierKind)],
    ) -> Result<LookupBatchResult, LookupError> {
        let requests: Vec<LookupRequest> = pairs
            .iter()
            .enumerate()
            .map(|(row, (organism, identifier, kind))| LookupRequest {
                row,
                organism: organism.clone(),
                kind: *kind,
                identifier: identifier.clone(),
            })
            .collect();
        self.resolve_batch(&requests).await
    }
}

// ============================================================================
// SECTION: Free Helpers
// ============================================================================

/// Maps an [`IdentifierKind`] to the string used as its group key component.
fn kind_marker(kind: IdentifierKind) -> &'static str {
    match kind {
        IdentifierKind::Gene => "gene",
        IdentifierKind::Variant => "variant",
    }
}

/// Builds the outcome for a request resolved by a cache hit.
fn outcome_from_cache_entry(request: &LookupRequest, entry: &CacheEntry) -> LookupOutcome {
    let status = match entry.resolution {
        CacheResolution::Valid => LookupStatus::Confirmed,
        CacheResolution::NotFound => LookupStatus::NotFound,
        CacheResolution::Ambiguous { .. } => LookupStatus::Ambiguous,
    };
    LookupOutcome {
        row: request.row,
        kind: request.kind,
        identifier: request.identifier.clone(),
        status,
        source: "cache".to_string(),
    }
}

/// Builds the cache entry to store for a freshly resolved provider answer.
fn cache_entry_for(
    answer: &ProviderAnswer,
    source: &str,
    stored_at: Timestamp,
    expires_at: Timestamp,
) -> CacheEntry {
    let (resolution, canonical_name) = match answer {
        ProviderAnswer::Found { canonical_name } => (CacheResolution::Valid, canonical_name.clone()),
        ProviderAnswer::NotFound => (CacheResolution::NotFound, None),
        ProviderAnswer::Ambiguous { candidate_count } => {
            (CacheResolution::Ambiguous { candidate_count: *candidate_count }, None)
        }
    };
    CacheEntry { resolution, canonical_name, provider: source.to_string(), stored_at, expires_at }
}

/// Builds the outcome for a request resolved via the leader/follower fan-out.
fn outcome_from_shared(request: &LookupRequest, shared: &SharedOutcome) -> LookupOutcome {
    let (status, source) = match shared {
        SharedOutcome::Resolved { answer: ProviderAnswer::Found { .. }, source } => {
            (LookupStatus::Confirmed, (*source).to_string())
        }
        SharedOutcome::Resolved { answer: ProviderAnswer::NotFound, source } => {
            (LookupStatus::NotFound, (*source).to_string())
        }
        SharedOutcome::Resolved { answer: ProviderAnswer::Ambiguous { .. }, source } => {
            (LookupStatus::Ambiguous, (*source).to_string())
        }
        SharedOutcome::Degraded { .. } => (LookupStatus::Degraded, "degraded".to_string()),
    };
    LookupOutcome { row: request.row, kind: request.kind, identifier: request.identifier.clone(), status, source }
}

/// Replaces every still-`None` slot with a degraded placeholder; this should
/// be unreachable in practice (every index is filled by the cache phase, the
/// leader/follower fan-out, or the chunk loop) but guards against a logic
/// error silently dropping a row from the report.
fn finalize_outcomes(outcomes: Vec<Option<LookupOutcome>>) -> Vec<LookupOutcome> {
    outcomes
        .into_iter()
        .enumerate()
        .map(|(index, outcome)| {
            outcome.unwrap_or_else(|| LookupOutcome {
                row: index,
                kind: IdentifierKind::Gene,
                identifier: String::new(),
                status: LookupStatus::Degraded,
                source: "degraded".to_string(),
            })
        })
        .collect()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use biovalidate_cache_sqlite::CacheConfig;
    use biovalidate_providers::ProviderError;
    use tempfile::tempdir;

    use super::*;

    /// A scripted [`IdentifierLookupClient`] double; records how many times it
    /// was called and answers every identifier the same way.
    struct StubClient {
        /// Stable name reported to the subsystem.
        name: &'static str,
        /// Whether `resolve` claims batch capability.
        batch_capable: bool,
        /// Number of completed `resolve` calls.
        calls: AtomicUsize,
        /// Scripted answer applied to every identifier in a call.
        answer: fn(&str) -> Result<ProviderAnswer, ProviderError>,
    }

    #[async_trait]
    impl IdentifierLookupClient for StubClient {
        async fn resolve(
            &self,
            _organism: &str,
            _kind: IdentifierKind,
            identifiers: &[String],
        ) -> Result<Vec<ProviderAnswer>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            identifiers.iter().map(|identifier| (self.answer)(identifier)).collect()
        }

        fn name(&self) -> &'static str {
            self.name
        }

        fn batch_capable(&self) -> bool {
            self.batch_capable
        }
    }

    fn request(row: usize, identifier: &str) -> LookupRequest {
        LookupRequest {
            row,
            organism: "human".to_string(),
            kind: IdentifierKind::Gene,
            identifier: identifier.to_string(),
        }
    }

    fn fast_config() -> LookupSubsystemConfig {
        LookupSubsystemConfig {
            cache_enabled: false,
            primary_rate_limit_per_sec: 1_000.0,
            secondary_rate_limit_per_sec: 1_000.0,
            ..LookupSubsystemConfig::default()
        }
    }

    #[tokio::test]
    async fn primary_success_is_confirmed_and_written_back_to_cache() {
        let dir = tempdir().expect("tempdir");
        let cache = SqliteCache::open(&CacheConfig::new(dir.path().join("cache.db"))).expect("open cache");
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| Ok(ProviderAnswer::Found { canonical_name: Some("TP53".to_string()) }),
        });
        let config = LookupSubsystemConfig { cache_enabled: true, ..fast_config() };
        let subsystem = LookupSubsystem::new(config, Some(cache), primary.clone(), None);

        let result = subsystem.resolve_batch(&[request(0, "TP53")]).await.expect("resolve");
        assert_eq!(result.cache_misses, 1);
        assert_eq!(result.failovers, 0);
        assert_eq!(result.outcomes[0].status, LookupStatus::Confirmed);
        assert_eq!(result.outcomes[0].source, "primary");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_hit_skips_the_provider_entirely() {
        let dir = tempdir().expect("tempdir");
        let cache = SqliteCache::open(&CacheConfig::new(dir.path().join("cache.db"))).expect("open cache");
        let now = Timestamp::now();
        cache
            .put(
                &CacheKey::new("human", "TP53"),
                &CacheEntry {
                    resolution: CacheResolution::Valid,
                    canonical_name: Some("TP53".to_string()),
                    provider: "primary".to_string(),
                    stored_at: now,
                    expires_at: now.plus(Duration::from_secs(3_600)),
                },
            )
            .await
            .expect("seed cache");

        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| panic!("primary must not be called on a cache hit"),
        });
        let config = LookupSubsystemConfig { cache_enabled: true, ..fast_config() };
        let subsystem = LookupSubsystem::new(config, Some(cache), primary.clone(), None);

        let result = subsystem.resolve_batch(&[request(0, "TP53")]).await.expect("resolve");
        assert_eq!(result.cache_hits, 1);
        assert_eq!(result.cache_misses, 0);
        assert_eq!(result.outcomes[0].status, LookupStatus::Confirmed);
        assert_eq!(result.outcomes[0].source, "cache");
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn primary_failure_fails_over_to_secondary() {
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| Err(ProviderError::Timeout),
        });
        let secondary = Arc::new(StubClient {
            name: "secondary",
            batch_capable: false,
            calls: AtomicUsize::new(0),
            answer: |_| Ok(ProviderAnswer::NotFound),
        });
        let subsystem = LookupSubsystem::new(fast_config(), None, primary, Some(secondary.clone()));

        let result = subsystem.resolve_batch(&[request(0, "TP53")]).await.expect("resolve");
        assert_eq!(result.failovers, 1);
        assert_eq!(result.outcomes[0].status, LookupStatus::NotFound);
        assert_eq!(result.outcomes[0].source, "secondary");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn both_providers_failing_degrades_the_outcome() {
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| Err(ProviderError::Timeout),
        });
        let secondary = Arc::new(StubClient {
            name: "secondary",
            batch_capable: false,
            calls: AtomicUsize::new(0),
            answer: |_| Err(ProviderError::Timeout),
        });
        let subsystem = LookupSubsystem::new(fast_config(), None, primary, Some(secondary));

        let result = subsystem.resolve_batch(&[request(0, "TP53")]).await.expect("resolve");
        assert_eq!(result.failovers, 0);
        assert_eq!(result.outcomes[0].status, LookupStatus::Degraded);
    }

    #[tokio::test]
    async fn ambiguous_answers_round_trip_through_the_cache() {
        let dir = tempdir().expect("tempdir");
        let cache = SqliteCache::open(&CacheConfig::new(dir.path().join("cache.db"))).expect("open cache");
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| Ok(ProviderAnswer::Ambiguous { candidate_count: 3 }),
        });
        let config = LookupSubsystemConfig { cache_enabled: true, ..fast_config() };
        let subsystem = LookupSubsystem::new(config, Some(cache), primary.clone(), None);

        let first = subsystem.resolve_batch(&[request(0, "AMBIG1")]).await.expect("resolve");
        assert_eq!(first.outcomes[0].status, LookupStatus::Ambiguous);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);

        let second = subsystem.resolve_batch(&[request(0, "AMBIG1")]).await.expect("resolve");
        assert_eq!(second.cache_hits, 1);
        assert_eq!(second.outcomes[0].status, LookupStatus::Ambiguous);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1, "second call must be served from cache");
    }

    #[tokio::test]
    async fn warm_populates_the_cache_for_a_later_run() {
        let dir = tempdir().expect("tempdir");
        let cache = SqliteCache::open(&CacheConfig::new(dir.path().join("cache.db"))).expect("open cache");
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| Ok(ProviderAnswer::Found { canonical_name: Some("TP53".to_string()) }),
        });
        let config = LookupSubsystemConfig { cache_enabled: true, ..fast_config() };
        let subsystem = LookupSubsystem::new(config, Some(cache), primary.clone(), None);

        let warmed = subsystem
            .warm(&[("human".to_string(), "TP53".to_string(), IdentifierKind::Gene)])
            .await
            .expect("warm");
        assert_eq!(warmed.cache_misses, 1);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);

        let result = subsystem.resolve_batch(&[request(0, "TP53")]).await.expect("resolve");
        assert_eq!(result.cache_hits, 1);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1, "warm should have already populated the cache");
    }

    #[tokio::test]
    async fn empty_batch_short_circuits_without_touching_either_provider() {
        let primary = Arc::new(StubClient {
            name: "primary",
            batch_capable: true,
            calls: AtomicUsize::new(0),
            answer: |_| panic!("must not be called"),
        });
        let subsystem = LookupSubsystem::new(fast_config(), None, primary.clone(), None);

        let result = subsystem.resolve_batch(&[]).await.expect("resolve");
        assert!(result.outcomes.is_empty());
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
    }
}
