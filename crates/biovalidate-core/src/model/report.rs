// biovalidate-core/src/model/report.rs
// ============================================================================
// Module: Validation Report Model
// Description: Stage results, ruleset metadata, and the final validation report.
// Purpose: Provide the serializable report shape handed back to callers.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! The [`ValidationReport`] is the single artifact returned by
//! [`crate::orchestrator::Orchestrator::validate`]. It is a pure data structure;
//! assembling it is the orchestrator's job, not the validators'.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as JsonValue;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::issue::Issue;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// UTC timestamp, serialized as an RFC 3339 string at second precision or better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Returns the current UTC timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Wraps an existing `OffsetDateTime`, normalizing it to UTC.
    #[must_use]
    pub fn from_offset_date_time(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the wrapped `OffsetDateTime`.
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns this timestamp advanced by `duration`, saturating instead of
    /// overflowing if `duration` is absurdly large.
    #[must_use]
    pub fn plus(&self, duration: std::time::Duration) -> Self {
        let offset = time::Duration::try_from(duration).unwrap_or(time::Duration::MAX);
        Self(self.0.saturating_add(offset))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.format(&Rfc3339) {
            Ok(formatted) => f.write_str(&formatted),
            Err(_) => write!(f, "{}", self.0.unix_timestamp()),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let formatted = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let parsed = OffsetDateTime::parse(&raw, &Rfc3339).map_err(serde::de::Error::custom)?;
        Ok(Self::from_offset_date_time(parsed))
    }
}

// ============================================================================
// SECTION: Stage Name
// ============================================================================

/// The closed set of pipeline stage names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    /// Record-level structural contract checks.
    Schema,
    /// Vectorized tabular consistency/duplicate/bias checks.
    Rules,
    /// Domain-specific sequence/annotation checks.
    BioRules,
    /// External identifier lookups.
    BioLookups,
    /// Severity aggregation and decision.
    Policy,
}

impl StageName {
    /// Returns the wire representation of this stage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Rules => "rules",
            Self::BioRules => "bio_rules",
            Self::BioLookups => "bio_lookups",
            Self::Policy => "policy",
        }
    }

    /// The stage ordering used when assembling the report, independent of
    /// which bio stage actually finished first at runtime.
    #[must_use]
    pub const fn report_order() -> [Self; 5] {
        [Self::Schema, Self::Rules, Self::BioRules, Self::BioLookups, Self::Policy]
    }
}

// ============================================================================
// SECTION: Stage Result
// ============================================================================

/// The result of running a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage name.
    pub stage_name: StageName,
    /// `true` iff no issue in this stage has severity ≥ `error`.
    pub passed: bool,
    /// Issues in production order.
    pub issues: Vec<Issue>,
    /// Wall-clock execution time for this stage, in milliseconds.
    pub execution_time_ms: u64,
    /// Stage-specific metadata (e.g. lookup-subsystem cache statistics).
    #[serde(default)]
    pub stage_metadata: Map<String, JsonValue>,
}

impl StageResult {
    /// Builds a stage result, deriving `passed` from the issue list.
    #[must_use]
    pub fn new(stage_name: StageName, issues: Vec<Issue>, execution_time_ms: u64) -> Self {
        let passed = !issues.iter().any(|issue| issue.severity.is_at_least_error());
        Self {
            stage_name,
            passed,
            issues,
            execution_time_ms,
            stage_metadata: Map::new(),
        }
    }

    /// Attaches stage metadata, replacing any existing metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, JsonValue>) -> Self {
        self.stage_metadata = metadata;
        self
    }

    /// Returns true if any issue in this stage has at least `critical` severity.
    #[must_use]
    pub fn has_critical(&self) -> bool {
        self.issues.iter().any(|issue| issue.severity == crate::model::issue::Severity::Critical)
    }
}

// ============================================================================
// SECTION: Ruleset Metadata
// ============================================================================

/// Identity of the rule configuration in effect for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesetMetadata {
    /// Semver version string declared in the rules config, or `"unknown"`.
    pub version: String,
    /// `last_updated` date declared in the rules config, as an ISO-8601 date string.
    pub last_updated: Option<String>,
    /// Path the rules config was read from.
    pub source: String,
    /// First 16 hex characters of the SHA-256 digest over the config file bytes.
    /// `None` when the file lacks version metadata entirely.
    pub hash: Option<String>,
    /// `changes` entries from the most recent changelog entry.
    pub latest_changes: Vec<String>,
}

// ============================================================================
// SECTION: API Configuration Snapshot
// ============================================================================

/// A snapshot of the lookup subsystem's effective configuration for the run,
/// embedded in every report for reproducibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfiguration {
    /// Whether the persistent cache was enabled for this run.
    pub cache_enabled: bool,
    /// Whether the secondary (failover) provider was enabled.
    pub secondary_provider_enabled: bool,
    /// Effective primary-provider rate limit, in requests per second.
    pub primary_rate_limit_per_sec: f64,
    /// Effective secondary-provider rate limit, in requests per second.
    pub secondary_rate_limit_per_sec: f64,
    /// Effective cache entry TTL, in hours.
    pub cache_ttl_hours: u64,
}

// ============================================================================
// SECTION: Decision
// ============================================================================

/// The final accept / conditional-accept / reject decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Dataset accepted outright.
    Accepted,
    /// Dataset accepted with caveats surfaced to the caller.
    ConditionalAccept,
    /// Dataset rejected.
    Rejected,
}

// ============================================================================
// SECTION: Validation Report
// ============================================================================

/// The complete, reproducible output of a validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Freshly generated unique identifier for this run.
    pub validation_id: String,
    /// Dataset identifier, copied from the input metadata.
    pub dataset_id: String,
    /// UTC timestamp at which the run completed.
    pub timestamp: Timestamp,
    /// Final accept / conditional-accept / reject decision.
    pub final_decision: Decision,
    /// One-sentence rationale for the decision.
    pub rationale: String,
    /// Whether the policy engine flagged this run for human review.
    pub requires_human_review: bool,
    /// Total wall-clock execution time for the run, in seconds.
    pub execution_time_seconds: f64,
    /// Whether the pipeline was short-circuited before completing all stages.
    pub short_circuited: bool,
    /// Stage results, in schema → rules → bio_rules → bio_lookups → policy order,
    /// regardless of which stages actually ran or which bio stage finished first.
    pub stages: Vec<StageResult>,
    /// Identity of the rule configuration in effect for this run.
    pub ruleset_metadata: RulesetMetadata,
    /// Snapshot of the lookup subsystem's effective configuration.
    pub api_configuration: ApiConfiguration,
}

impl ValidationReport {
    /// Returns the result for a given stage, if it ran.
    #[must_use]
    pub fn stage(&self, name: StageName) -> Option<&StageResult> {
        self.stages.iter().find(|stage| stage.stage_name == name)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test-only assertions are permitted to panic"
)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips_through_json() {
        let original = Timestamp::now();
        let json = serde_json::to_string(&original).expect("serialize");
        let restored: Timestamp = serde_json::from_str(&json).expect("deserialize");
        // RFC 3339 formatting truncates sub-second precision loss only if the
        // underlying clock provides it; compare at second granularity.
        assert_eq!(
            original.as_offset_date_time().unix_timestamp(),
            restored.as_offset_date_time().unix_timestamp()
        );
    }

    #[test]
    fn stage_result_passed_is_false_when_error_present() {
        use crate::model::issue::Severity;
        let issues = vec![Issue::table_level(Severity::Error, "X_001", "bad")];
        let result = StageResult::new(StageName::Rules, issues, 10);
        assert!(!result.passed);
    }

    #[test]
    fn stage_result_passed_is_true_with_only_warnings() {
        use crate::model::issue::Severity;
        let issues = vec![Issue::table_level(Severity::Warning, "X_002", "hmm")];
        let result = StageResult::new(StageName::Rules, issues, 5);
        assert!(result.passed);
    }
}
