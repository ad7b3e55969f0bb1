// biovalidate-providers/src/primary.rs
// ============================================================================
// Module: Primary Gene Identifier Provider
// Description: Batch-capable HTTP client modeled on the NCBI Gene lookup API.
// Purpose: Resolve gene/variant identifiers with one request per batch.
// Dependencies: biovalidate-core, reqwest, serde, serde_json, crate::{error, retry}
// ============================================================================

//! ## Overview
//! [`NcbiGeneProvider`] is the higher-throughput primary provider: it accepts
//! an API key for a raised rate limit and resolves an entire chunk of
//! identifiers in one HTTP call. Retries with backoff are applied internally
//! per [`crate::retry::retry_with_backoff`]; the caller (the lookup
//! subsystem) only sees the final [`ProviderAnswer`] list or a terminal
//! [`ProviderError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use biovalidate_core::IdentifierKind;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;

use crate::client::IdentifierLookupClient;
use crate::client::ProviderAnswer;
use crate::error::ProviderError;
use crate::retry::BackoffPolicy;
use crate::retry::retry_with_backoff;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for [`NcbiGeneProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryProviderConfig {
    /// Base URL of the batch lookup endpoint (no trailing slash).
    pub base_url: String,
    /// API key; its presence is what unlocks the higher rate limit upstream
    /// in the lookup subsystem's `EnvConfig`-derived limiter, but it is also
    /// sent here as a request credential.
    pub api_key: Option<String>,
    /// Per-request timeout, independent of the overall pipeline deadline.
    pub request_timeout: Duration,
    /// Retry/backoff policy applied to transient failures.
    pub backoff: BackoffPolicy,
}

impl Default for PrimaryProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/biovalidate/gene".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
        }
    }
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Outbound batch lookup request body.
#[derive(Debug, Serialize)]
struct BatchRequestBody<'a> {
    /// Organism the identifiers are scoped to.
    organism: &'a str,
    /// Wire name of the identifier kind (`"gene"` or `"variant"`).
    kind: &'static str,
    /// Identifiers to resolve, in request order.
    identifiers: &'a [String],
}

/// One identifier's resolution as returned by the provider.
#[derive(Debug, Deserialize)]
struct BatchResultEntry {
    /// Whether the identifier was confirmed.
    found: bool,
    /// Whether more than one candidate matched.
    ambiguous: bool,
    /// Candidate count when `ambiguous` is true.
    #[serde(default)]
    candidate_count: usize,
    /// Canonical name, when the provider supplied one.
    #[serde(default)]
    canonical_name: Option<String>,
}

/// Inbound batch lookup response body.
#[derive(Debug, Deserialize)]
struct BatchResponseBody {
    /// One result per requested identifier, in request order.
    results: Vec<BatchResultEntry>,
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

/// HTTP client for the primary (NCBI-modeled) identifier provider.
pub struct NcbiGeneProvider {
    /// Endpoint, credentials, timeout, and retry policy.
    config: PrimaryProviderConfig,
    /// Underlying HTTP client.
    client: Client,
}

impl NcbiGeneProvider {
    /// Builds a new primary provider client.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] when the underlying HTTP client
    /// cannot be constructed (invalid TLS configuration, etc.).
    pub fn new(config: PrimaryProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ProviderError::Network(err.to_string()))?;
        Ok(Self { config, client })
    }

    /// Issues a single batch request without retrying.
    async fn send_once(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
    ) -> Result<Vec<ProviderAnswer>, ProviderError> {
        let body = BatchRequestBody { organism, kind: kind_wire_name(kind), identifiers };
        let mut request = self.client.post(format!("{}/batch", self.config.base_url)).json(&body);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("x-api-key", api_key);
        }
        let response = request.send().await.map_err(|err| {
            if err.is_timeout() { ProviderError::Timeout } else { ProviderError::Network(err.to_string()) }
        })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus { status: response.status().as_u16() });
        }
        let parsed: BatchResponseBody =
            response.json().await.map_err(|err| ProviderError::Decode(err.to_string()))?;
        if parsed.results.len() != identifiers.len() {
            return Err(ProviderError::Decode(format!(
                "expected {} results, provider returned {}",
                identifiers.len(),
                parsed.results.len()
            )));
        }
        Ok(parsed
            .results
            .into_iter()
            .map(|entry| {
                if entry.ambiguous {
                    ProviderAnswer::Ambiguous { candidate_count: entry.candidate_count }
                } else if entry.found {
                    ProviderAnswer::Found { canonical_name: entry.canonical_name }
                } else {
                    ProviderAnswer::NotFound
                }
            })
            .collect())
    }
}

#[async_trait]
impl IdentifierLookupClient for NcbiGeneProvider {
    async fn resolve(
        &self,
        organism: &str,
        kind: IdentifierKind,
        identifiers: &[String],
    ) -> Result<Vec<ProviderAnswer>, ProviderError> {
        if identifiers.is_empty() {
            return Ok(Vec::new());
        }
        retry_with_backoff(self.config.backoff, || self.send_once(organism, kind, identifiers)).await
    }

    fn name(&self) -> &'static str {
        "primary"
    }

    fn batch_capable(&self) -> bool {
        true
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
        let provider = NcbiGeneProvider::new(PrimaryProviderConfig::default()).expect("client builds");
        let answers = provider.resolve("human", IdentifierKind::Gene, &[]).await.expect("resolve");
        assert!(answers.is_empty());
    }
}
