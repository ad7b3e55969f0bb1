// biovalidate-providers/src/client.rs
// ============================================================================
// Module: Identifier Lookup Client Interface
// Description: The uniform surface both concrete providers implement.
// Purpose: Let biovalidate-lookup treat primary and secondary providers
//          identically regardless of their batch capability.
// Dependencies: async-trait, biovalidate-core, crate::error
// ============================================================================

//! ## Overview
//! [`IdentifierLookupClient`] is deliberately narrow: resolve a list of
//! identifiers for one organism and one identifier kind. A provider that
//! lacks native batch support (the secondary provider) still implements this
//! signature by looping internally, one request per identifier; the caller
//! never needs to know which strategy is in play.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use biovalidate_core::IdentifierKind;

use crate::error::ProviderError;

// ============================================================================
// SECTION: Answer
// ============================================================================

/// The outcome a provider reports for a single identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderAnswer {
    /// The identifier was confirmed; carries the canonical name when the
    /// provider's payload included one.
    Found {
        /// Canonical name reported by the provider, if any.
        canonical_name: Option<String>,
    },
    /// The provider affirmatively reports no match exists.
    NotFound,
    /// The provider matched more than one candidate for this identifier.
    Ambiguous {
        /// Number of candidate matches the provider returned.
        candidate_count: usize,
    },
}

// ============================================================================
// SECTION: Client Trait
// ============================================================================

/// A client for one external identifier-resolution provider.
#[async_trait]
pub trait IdentifierLookupClient: Send + Sync {
    /// Resolves `identifiers` for the given `organism` and `kind`.
    ///
    /// Returns one [`ProviderAnswer`] per input identifier, in input order.
    /// A failure to reach or parse the provider at all is a [`ProviderError`];
    /// "not found" and "ambiguous" are themselves successful answers, never
    /// errors, since the provider understood the request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the request could not be completed
    /// (network failure, non-success status, decode failure) even after
    /// this client's own internal retry policy has been exhausted.
    async fn resolve(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
    ) -> Result<Vec<ProviderAnswer>, ProviderError>;

    /// Stable provider name embedded in [`biovalidate_core::LookupOutcome::source`].
    fn name(&self) -> &'static str;

    /// True if this provider accepts multiple identifiers in a single
    /// network call rather than looping internally.
    fn batch_capable(&self) -> bool;
}
