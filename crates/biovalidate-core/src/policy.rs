// biovalidate-core/src/policy.rs
// ============================================================================
// Module: Policy Decision Engine
// Description: Severity aggregation, decision matrix, and human-review triggers.
// Purpose: Turn the assembled stage results into a final decision and rationale.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! The policy engine is a pure function of the aggregated severity counts and
//! its own configuration: it never inspects individual issues beyond their
//! severity, and it never sets `requires_human_review` from a validator's
//! own judgment. This keeps the decision auditable and reproducible for a
//! given `(stage results, config)` pair.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::Decision;
use crate::model::Severity;
use crate::model::StageResult;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Thresholds driving the accept / conditional-accept / reject decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionMatrixConfig {
    /// Minimum critical-issue count that forces `rejected`.
    pub critical_threshold: u64,
    /// Minimum error-issue count that forces `rejected`.
    pub error_threshold: u64,
    /// Minimum warning-issue count that forces `conditional_accept`.
    pub warning_threshold: u64,
}

impl Default for DecisionMatrixConfig {
    fn default() -> Self {
        Self { critical_threshold: 1, error_threshold: 5, warning_threshold: 10 }
    }
}

/// Thresholds driving the `requires_human_review` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanReviewTriggersConfig {
    /// Trigger review whenever any critical issue is present.
    pub on_critical: bool,
    /// Trigger review when the error count reaches this threshold.
    pub error_count_threshold: u64,
    /// Trigger review when the warning count reaches this threshold.
    pub warning_count_threshold: u64,
}

impl Default for HumanReviewTriggersConfig {
    fn default() -> Self {
        Self { on_critical: true, error_count_threshold: 3, warning_count_threshold: 15 }
    }
}

/// Engine-facing policy configuration, assembled by `biovalidate-config` from
/// the policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyEngineConfig {
    /// Decision matrix thresholds.
    pub decision_matrix: DecisionMatrixConfig,
    /// Human-review trigger thresholds.
    pub human_review_triggers: HumanReviewTriggersConfig,
}

// ============================================================================
// SECTION: Severity Counts
// ============================================================================

/// Aggregated issue counts by severity across every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityCounts {
    /// Count of `info`-severity issues.
    pub info: u64,
    /// Count of `warning`-severity issues.
    pub warning: u64,
    /// Count of `error`-severity issues.
    pub error: u64,
    /// Count of `critical`-severity issues.
    pub critical: u64,
}

impl SeverityCounts {
    /// Aggregates severity counts across every issue in every given stage.
    #[must_use]
    pub fn aggregate(stages: &[StageResult]) -> Self {
        let mut counts = Self::default();
        for stage in stages {
            for issue in &stage.issues {
                match issue.severity {
                    Severity::Info => counts.info += 1,
                    Severity::Warning => counts.warning += 1,
                    Severity::Error => counts.error += 1,
                    Severity::Critical => counts.critical += 1,
                }
            }
        }
        counts
    }
}

// ============================================================================
// SECTION: Policy Outcome
// ============================================================================

/// The result of running the policy engine over a set of stage results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    /// Final accept / conditional-accept / reject decision.
    pub decision: Decision,
    /// Whether the run should be flagged for human review.
    pub requires_human_review: bool,
    /// One-sentence rationale for the decision.
    pub rationale: String,
    /// The severity counts the decision was computed from.
    pub counts: SeverityCounts,
}

// ============================================================================
// SECTION: Policy Engine
// ============================================================================

/// Stateless severity-aggregation and decision-matrix evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyEngine {
    /// Decision matrix and human-review thresholds in effect.
    config: PolicyEngineConfig,
}

impl PolicyEngine {
    /// Builds a policy engine from the given configuration.
    #[must_use]
    pub const fn new(config: PolicyEngineConfig) -> Self {
        Self { config }
    }

    /// Evaluates the decision matrix and review triggers over `stages`.
    ///
    /// This is a pure function: the same stage results and configuration
    /// always produce the same outcome.
    #[must_use]
    pub fn evaluate(&self, stages: &[StageResult]) -> PolicyOutcome {
        let counts = SeverityCounts::aggregate(stages);
        let matrix = &self.config.decision_matrix;

        let (decision, trigger) = if counts.critical >= matrix.critical_threshold {
            (Decision::Rejected, "critical issue(s) met or exceeded the critical threshold")
        } else if counts.error >= matrix.error_threshold {
            (Decision::Rejected, "error count met or exceeded the error threshold")
        } else if counts.warning >= matrix.warning_threshold {
            (Decision::ConditionalAccept, "warning count met or exceeded the warning threshold")
        } else {
            (Decision::Accepted, "no threshold was exceeded")
        };

        let triggers = &self.config.human_review_triggers;
        let requires_human_review = (triggers.on_critical && counts.critical > 0)
            || counts.error >= triggers.error_count_threshold
            || counts.warning >= triggers.warning_count_threshold;

        let rationale = Self::rationale(decision, trigger, counts);
        PolicyOutcome { decision, requires_human_review, rationale, counts }
    }

    /// Renders the one-sentence rationale embedded in the report.
    fn rationale(decision: Decision, trigger: &str, counts: SeverityCounts) -> String {
        let verb = match decision {
            Decision::Accepted => "Accepted",
            Decision::ConditionalAccept => "Conditionally accepted",
            Decision::Rejected => "Rejected",
        };
        format!(
            "{verb}: {trigger} ({} critical, {} error(s), {} warning(s), {} info)",
            counts.critical, counts.error, counts.warning, counts.info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Issue;
    use crate::model::StageName;

    fn stage_with(severity: Severity, count: usize) -> StageResult {
        let issues = (0..count).map(|_| Issue::table_level(severity, "X", "x")).collect();
        StageResult::new(StageName::Rules, issues, 0)
    }

    #[test]
    fn exactly_critical_threshold_rejects() {
        let engine = PolicyEngine::default();
        let outcome = engine.evaluate(&[stage_with(Severity::Critical, 1)]);
        assert_eq!(outcome.decision, Decision::Rejected);
    }

    #[test]
    fn exactly_one_below_error_threshold_does_not_reject() {
        let engine = PolicyEngine::default();
        let outcome = engine.evaluate(&[stage_with(Severity::Error, 4)]);
        assert_ne!(outcome.decision, Decision::Rejected);
    }

    #[test]
    fn no_issues_accepts_without_review() {
        let engine = PolicyEngine::default();
        let outcome = engine.evaluate(&[]);
        assert_eq!(outcome.decision, Decision::Accepted);
        assert!(!outcome.requires_human_review);
    }

    #[test]
    fn warning_threshold_triggers_conditional_accept() {
        let engine = PolicyEngine::default();
        let outcome = engine.evaluate(&[stage_with(Severity::Warning, 10)]);
        assert_eq!(outcome.decision, Decision::ConditionalAccept);
    }

    #[test]
    fn single_critical_triggers_review_by_default() {
        let engine = PolicyEngine::default();
        let outcome = engine.evaluate(&[stage_with(Severity::Critical, 1)]);
        assert!(outcome.requires_human_review);
    }

    #[test]
    fn decision_is_a_pure_function_of_counts() {
        let engine = PolicyEngine::default();
        let stages = vec![stage_with(Severity::Warning, 3), stage_with(Severity::Error, 1)];
        let first = engine.evaluate(&stages);
        let second = engine.evaluate(&stages);
        assert_eq!(first, second);
    }
}
