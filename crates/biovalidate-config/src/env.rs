// biovalidate-config/src/env.rs
// ============================================================================
// Module: Environment Knobs
// Description: Parses the recognized environment variables into typed fields.
// Purpose: Resolve lookup-subsystem and orchestrator overrides from the process
//          environment without scattering `std::env::var` calls.
// Dependencies: none beyond std
// ============================================================================

//! ## Overview
//! Every recognized environment variable has a default that matches the
//! behavior when the variable is unset. Unparseable values fall back to the
//! default rather than failing the run; a malformed environment variable is
//! an operator mistake, not a reason to refuse to validate data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;

// ============================================================================
// SECTION: Env Config
// ============================================================================

/// The resolved set of environment-driven overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvConfig {
    /// `NCBI_API_KEY` — unlocks the higher primary-provider rate limit when present.
    pub ncbi_api_key: Option<String>,
    /// `CACHE_ENABLED` — turns the lookup cache on or off.
    pub cache_enabled: bool,
    /// `CACHE_PATH` — file path for the cache store.
    pub cache_path: String,
    /// `CACHE_TTL_HOURS` — cache entry lifetime, in hours.
    pub cache_ttl_hours: u64,
    /// `ENSEMBL_ENABLED` — enables secondary-provider failover.
    pub ensembl_enabled: bool,
    /// `ENSEMBL_RATE_LIMIT_DELAY` — secondary rate-limit interval, in seconds.
    pub ensembl_rate_limit_delay_secs: f64,
    /// `ORCHESTRATOR_TIMEOUT_SECONDS` — overall pipeline deadline, in seconds.
    pub orchestrator_timeout_seconds: u64,
    /// `ENABLE_SHORT_CIRCUIT` — short-circuit toggle.
    pub enable_short_circuit: bool,
    /// `ENABLE_PARALLEL_BIO` — parallel bio-stage toggle.
    pub enable_parallel_bio: bool,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            ncbi_api_key: None,
            cache_enabled: true,
            cache_path: "biovalidate_cache.sqlite3".to_string(),
            cache_ttl_hours: 24 * 7,
            ensembl_enabled: true,
            ensembl_rate_limit_delay_secs: 1.0 / 15.0,
            orchestrator_timeout_seconds: 300,
            enable_short_circuit: true,
            enable_parallel_bio: true,
        }
    }
}

impl EnvConfig {
    /// Resolves the environment config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_reader(|name| env::var(name).ok())
    }

    /// Resolves the environment config from an arbitrary lookup function,
    /// so callers (and tests) can supply a fake environment without mutating
    /// the real process environment.
    #[must_use]
    pub fn from_reader(reader: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            ncbi_api_key: reader("NCBI_API_KEY"),
            cache_enabled: parse_bool(reader("CACHE_ENABLED"), defaults.cache_enabled),
            cache_path: reader("CACHE_PATH").unwrap_or(defaults.cache_path),
            cache_ttl_hours: parse_u64(reader("CACHE_TTL_HOURS"), defaults.cache_ttl_hours),
            ensembl_enabled: parse_bool(reader("ENSEMBL_ENABLED"), defaults.ensembl_enabled),
            ensembl_rate_limit_delay_secs: parse_f64(
                reader("ENSEMBL_RATE_LIMIT_DELAY"),
                defaults.ensembl_rate_limit_delay_secs,
            ),
            orchestrator_timeout_seconds: parse_u64(
                reader("ORCHESTRATOR_TIMEOUT_SECONDS"),
                defaults.orchestrator_timeout_seconds,
            ),
            enable_short_circuit: parse_bool(
                reader("ENABLE_SHORT_CIRCUIT"),
                defaults.enable_short_circuit,
            ),
            enable_parallel_bio: parse_bool(
                reader("ENABLE_PARALLEL_BIO"),
                defaults.enable_parallel_bio,
            ),
        }
    }

    /// Returns the effective primary-provider rate limit, in requests per second,
    /// derived from whether an API key is configured.
    #[must_use]
    pub fn primary_rate_limit_per_sec(&self) -> f64 {
        if self.ncbi_api_key.is_some() { 10.0 } else { 3.0 }
    }

    /// Returns the effective secondary-provider rate limit, in requests per second.
    #[must_use]
    pub fn secondary_rate_limit_per_sec(&self) -> f64 {
        if self.ensembl_rate_limit_delay_secs <= 0.0 {
            15.0
        } else {
            1.0 / self.ensembl_rate_limit_delay_secs
        }
    }
}

/// Parses a loosely-cased boolean environment value, falling back to `default`.
fn parse_bool(raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim) {
        Some("1" | "true" | "TRUE" | "True" | "yes") => true,
        Some("0" | "false" | "FALSE" | "False" | "no") => false,
        _ => default,
    }
}

/// Parses an unsigned integer environment value, falling back to `default`.
fn parse_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

/// Parses a floating-point environment value, falling back to `default`.
fn parse_f64(raw: Option<String>, default: f64) -> f64 {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EnvConfig::default();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl_hours, 168);
        assert!(config.ensembl_enabled);
        assert_eq!(config.orchestrator_timeout_seconds, 300);
        assert!(config.enable_short_circuit);
        assert!(config.enable_parallel_bio);
    }

    #[test]
    fn malformed_value_falls_back_to_default() {
        let config = EnvConfig::from_reader(|name| {
            if name == "CACHE_TTL_HOURS" { Some("not-a-number".to_string()) } else { None }
        });
        assert_eq!(config.cache_ttl_hours, EnvConfig::default().cache_ttl_hours);
    }

    #[test]
    fn api_key_presence_raises_primary_rate_limit() {
        let with_key = EnvConfig::from_reader(|name| {
            (name == "NCBI_API_KEY").then(|| "secret".to_string())
        });
        let without_key = EnvConfig::from_reader(|_| None);
        assert!(with_key.primary_rate_limit_per_sec() > without_key.primary_rate_limit_per_sec());
    }

    #[test]
    fn false_variants_parse_as_false() {
        let config = EnvConfig::from_reader(|name| {
            (name == "CACHE_ENABLED").then(|| "false".to_string())
        });
        assert!(!config.cache_enabled);
    }
}
