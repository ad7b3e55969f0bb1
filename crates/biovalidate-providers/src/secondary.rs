// biovalidate-providers/src/secondary.rs
// ============================================================================
// Module: Secondary Gene Identifier Provider
// Description: Single-identifier HTTP client modeled on the Ensembl lookup API.
// Purpose: Failover target for chunks the primary provider could not resolve.
// Dependencies: biovalidate-core, reqwest, serde, serde_json, crate::{error, retry}
// ============================================================================

//! ## Overview
//! [`EnsemblGeneProvider`] has no batch endpoint: [`resolve`](IdentifierLookupClient::resolve)
//! issues one request per identifier, sequentially, each wrapped in its own
//! [`crate::retry::retry_with_backoff`]. The lookup subsystem is expected to
//! hold this provider to a lower concurrency cap than the primary, since every
//! identifier here costs a full round trip.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use biovalidate_core::IdentifierKind;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::IdentifierLookupClient;
use crate::client::ProviderAnswer;
use crate::error::ProviderError;
use crate::retry::BackoffPolicy;
use crate::retry::retry_with_backoff;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`EnsemblGeneProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryProviderConfig {
    /// Base URL of the per-identifier lookup endpoint (no trailing slash).
    pub base_url: String,
    /// Per-request timeout, independent of the overall pipeline deadline.
    pub request_timeout: Duration,
    /// Retry/backoff policy applied to transient failures, per identifier.
    pub backoff: BackoffPolicy,
}

impl Default for SecondaryProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://rest.ensembl.org/biovalidate/lookup".to_string(),
            request_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Inbound single-identifier lookup response body.
#[derive(Debug, Deserialize)]
struct LookupResponseBody {
    /// Whether the identifier was confirmed.
    found: bool,
    /// Whether more than one candidate matched.
    #[serde(default)]
    ambiguous: bool,
    /// Candidate count when `ambiguous` is true.
    #[serde(default)]
    candidate_count: usize,
    /// Canonical name, when the provider supplied one.
    #[serde(default)]
    canonical_name: Option<String>,
}

/// Maps an [`IdentifierKind`] to its wire representation.
fn kind_wire_name(kind: IdentifierKind) -> &'static str {
    match kind {
        IdentifierKind::Gene => "gene",
        IdentifierKind::Variant => "variant",
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// HTTP client for the secondary (Ensembl-modeled) identifier provider.
pub struct EnsemblGeneProvider {
    /// Endpoint, timeout, and retry policy.
    config: SecondaryProviderConfig,
    /// Underlying HTTP client.
    client: Client,
}

impl EnsemblGeneProvider {
    /// Builds a new secondary provider client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: SecondaryProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ProviderError::Network(err.to_string()))?;
        Ok(Self { config, client })
    }

    async fn resolve_one(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifier: &str,
    ) -> Result<ProviderAnswer, ProviderError> {
        let url = format!(
            "{}/{}/{}/{}",
            self.config.base_url,
            organism,
            kind_wire_name(kind),
            identifier
        );
        let response = self.client.get(url).send().await.map_err(|err| {
            if err.is_timeout() { ProviderError::Timeout } else { ProviderError::Network(err.to_string()) }
        })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(ProviderAnswer::NotFound);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus { status: response.status().as_u16() });
        }
        let parsed: LookupResponseBody =
            response.json().await.map_err(|err| ProviderError::Decode(err.to_string()))?;
        Ok(if parsed.ambiguous {
            ProviderAnswer::Ambiguous { candidate_count: parsed.candidate_count }
        } else if parsed.found {
            ProviderAnswer::Found { canonical_name: parsed.canonical_name }
        } else {
            ProviderAnswer::NotFound
        })
    }
}

#[async_trait]
impl IdentifierLookupClient for EnsemblGeneProvider {
    async fn resolve(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
    ) -> Result<Vec<ProviderAnswer>, ProviderError> {
        let mut answers = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let answer = retry_with_backoff(self.config.backoff, || {
                self.resolve_one(organism, kind, identifier)
            })
            .await?;
            answers.push(answer);
        }
        Ok(answers)
    }

    fn name(&self) -> &'static str {
        "secondary"
    }

    fn batch_capable(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_names_are_lowercase() {
        assert_eq!(kind_wire_name(IdentifierKind::Gene), "gene");
        assert_eq!(kind_wire_name(IdentifierKind::Variant), "variant");
    }

    #[tokio::test]
    async fn empty_identifier_list_resolves_to_empty_without_a_request() {
        let provider = EnsemblGeneProvider::new(SecondaryProviderConfig::default()).expect("client builds");
        let answers = provider.resolve("human", IdentifierKind::Gene, &[]).await.expect("resolve");
        assert!(answers.is_empty());
    }

    #[test]
    fn reports_itself_as_not_batch_capable() {
        let provider = EnsemblGeneProvider::new(SecondaryProviderConfig::default()).expect("client builds");
        assert!(!provider.batch_capable());
        assert_eq!(provider.name(), "secondary");
    }
}
