// biovalidate-core/src/model/issue.rs
// ============================================================================
// Module: Issue Model
// Description: The atomic finding produced by any validator.
// Purpose: Carry severity, stable rule identity, and affected rows for a finding.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every validator, regardless of stage, emits [`Issue`] records. Severities are
//! totally ordered (`info < warning < error < critical`) so the policy engine
//! can aggregate counts and the orchestrator can decide whether to
//! short-circuit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as JsonValue;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Ordered issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; never affects the decision.
    Info,
    /// Warning; contributes to `conditional_accept` and review triggers.
    Warning,
    /// Error; contributes to rejection thresholds.
    Error,
    /// Critical; can short-circuit the pipeline and always rejects.
    Critical,
}

impl Severity {
    /// Returns true if this severity is at least `error`.
    #[must_use]
    pub const fn is_at_least_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

// ============================================================================
// SECTION: Issue
// ============================================================================

/// A single validation finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue severity.
    pub severity: Severity,
    /// Stable rule identifier, e.g. `BIO_002`, `DUP_003`.
    pub rule_id: String,
    /// Column name this issue relates to, if any. `None` for table-level issues.
    pub field: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Ascending row indices affected by this issue. Empty for table-level issues.
    pub affected_rows: Vec<usize>,
    /// Rule-specific context, opaque to the orchestrator and policy engine.
    #[serde(default)]
    pub metadata: Map<String, JsonValue>,
}

impl Issue {
    /// Builds a table-level issue (no specific field or rows).
    #[must_use]
    pub fn table_level(severity: Severity, rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            rule_id: rule_id.into(),
            field: None,
            message: message.into(),
            affected_rows: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Builds a field-scoped issue carrying the given affected row indices.
    ///
    /// `affected_rows` must already be ascending; this is a caller invariant
    /// because callers typically build it during a single forward scan.
    #[must_use]
    pub fn for_field(
        severity: Severity,
        rule_id: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
        affected_rows: Vec<usize>,
    ) -> Self {
        Self {
            severity,
            rule_id: rule_id.into(),
            field: Some(field.into()),
            message: message.into(),
            affected_rows,
            metadata: Map::new(),
        }
    }

    /// Attaches rule-specific metadata, replacing any existing metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, JsonValue>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attaches affected row indices to an otherwise table-level issue.
    ///
    /// `affected_rows` must already be ascending; this is a caller invariant,
    /// matching [`Issue::for_field`].
    #[must_use]
    pub fn with_rows(mut self, affected_rows: Vec<usize>) -> Self {
        self.affected_rows = affected_rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering_is_total() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn severity_is_at_least_error_excludes_warning() {
        assert!(!Severity::Warning.is_at_least_error());
        assert!(Severity::Error.is_at_least_error());
        assert!(Severity::Critical.is_at_least_error());
    }
}
