// biovalidate-core/src/interfaces.rs
// ============================================================================
// Module: Lookup Provider Interface
// Description: Backend-agnostic interface the orchestrator uses for bio_lookups.
// Purpose: Decouple the orchestrator from the concrete cache/provider stack.
// Dependencies: async-trait, crate::model
// ============================================================================

//! ## Overview
//! The orchestrator depends only on [`BioLookupProvider`]; the concrete
//! implementation (cache, rate limiting, primary/secondary failover) lives in
//! a separate crate so `biovalidate-core` never links against `reqwest` or
//! `rusqlite` directly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::model::ApiConfiguration;

// ============================================================================
// SECTION: Lookup Request / Result
// ============================================================================

/// The external identifier system a lookup request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    /// NCBI Gene identifier.
    Gene,
    /// dbSNP / ClinVar style variant identifier.
    Variant,
}

/// A single identifier to resolve, tagged with its originating row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    /// Row index in the source table this identifier came from.
    pub row: usize,
    /// Organism the identifier is scoped to, as it appeared in the dataset
    /// (falls back to the dataset's declared organism, then `"unknown"`).
    pub organism: String,
    /// Which external system to query.
    pub kind: IdentifierKind,
    /// The raw identifier string as it appeared in the dataset.
    pub identifier: String,
}

/// Resolution status for a single identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// The identifier was confirmed by an authoritative provider.
    Confirmed,
    /// The identifier could not be found by any provider.
    NotFound,
    /// All providers were unavailable or timed out; the identifier is unverified.
    Degraded,
    /// Providers disagreed on whether the identifier exists.
    Ambiguous,
}

/// The outcome of resolving one [`LookupRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    /// Row index this outcome applies to.
    pub row: usize,
    /// Which external system was queried.
    pub kind: IdentifierKind,
    /// The identifier that was resolved.
    pub identifier: String,
    /// Resolution status.
    pub status: LookupStatus,
    /// Provider name that produced this outcome (`"cache"`, `"primary"`, `"secondary"`).
    pub source: String,
}

// ============================================================================
// SECTION: Batch Result
// ============================================================================

/// The aggregate result of resolving a batch of identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupBatchResult {
    /// One outcome per input request, in input order.
    pub outcomes: Vec<LookupOutcome>,
    /// Count of outcomes served from cache.
    pub cache_hits: usize,
    /// Count of outcomes that required a live provider call.
    pub cache_misses: usize,
    /// Count of outcomes resolved by the secondary provider after primary failure.
    pub failovers: usize,
    /// Effective configuration in force for this batch, embedded in the report.
    pub api_configuration: ApiConfiguration,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors a [`BioLookupProvider`] may return.
///
/// These never abort a validation run; the orchestrator contains them and
/// records a `degraded` outcome for the affected identifiers instead.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The subsystem-wide deadline elapsed before the batch completed.
    #[error("lookup batch timed out after {0:?}")]
    Timeout(std::time::Duration),
    /// The cache backend is unavailable.
    #[error("lookup cache unavailable: {0}")]
    CacheUnavailable(String),
    /// Every configured provider failed.
    #[error("all lookup providers failed: {0}")]
    AllProvidersFailed(String),
}

// ============================================================================
// SECTION: Provider Trait
// ============================================================================

/// Resolves batches of external identifiers, handling caching, rate limiting,
/// and primary/secondary failover internally.
#[async_trait]
pub trait BioLookupProvider: Send + Sync {
    /// Resolves a batch of identifiers.
    ///
    /// Implementations must never panic on network or parse failures; any
    /// per-identifier failure becomes a [`LookupStatus::Degraded`] outcome.
    /// Only subsystem-wide failures (cache backend down, deadline elapsed)
    /// should surface as [`LookupError`].
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the batch cannot be processed at all.
    async fn resolve_batch(&self, requests: &[LookupRequest]) -> Result<LookupBatchResult, LookupError>;

    /// Returns the lookup subsystem's effective configuration snapshot.
    fn api_configuration(&self) -> ApiConfiguration;
}
