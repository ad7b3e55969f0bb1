// biovalidate-providers/src/lib.rs
// ============================================================================
// Module: BioValidate Providers
// Description: Primary/secondary external gene-identifier HTTP clients.
// Purpose: Resolve (organism, identifier) pairs against authoritative gene
//          databases, with rate limiting and retry/backoff built in.
// Dependencies: crate::{client, error, primary, rate_limiter, retry, secondary}
// ============================================================================

//! ## Overview
//! This crate ships two HTTP-backed identifier providers: a primary provider
//! modeled on the NCBI Gene lookup API (batch-capable, higher rate limit with
//! an API key) and a secondary provider modeled on Ensembl's REST lookup
//! endpoint (single-identifier only, used for failover). Neither provider
//! knows about caching or failover policy; that composition lives in
//! `biovalidate-lookup`, which holds one [`IdentifierLookupClient`] per
//! provider and decides when to call which.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod error;
pub mod primary;
pub mod rate_limiter;
pub mod retry;
pub mod secondary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use client::IdentifierLookupClient;
pub use client::ProviderAnswer;
pub use error::ProviderError;
pub use primary::NcbiGeneProvider;
pub use primary::PrimaryProviderConfig;
pub use rate_limiter::TokenBucket;
pub use secondary::EnsemblGeneProvider;
pub use secondary::SecondaryProviderConfig;

#[cfg(test)]
mod tests {
    //! Test-only lint relaxations for panic-based assertions and debug output.
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]
}
