// biovalidate-config/src/policy_config.rs
// ============================================================================
// Module: Policy Configuration
// Description: Typed model and validation for the policy YAML document.
// Purpose: Drive the policy engine's decision matrix and review triggers.
// Dependencies: serde, serde_yaml
// ============================================================================

//! ## Overview
//! The policy config declares the decision matrix thresholds and the
//! human-review trigger thresholds consumed by
//! `biovalidate_core::policy::PolicyEngine`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use biovalidate_core::policy::DecisionMatrixConfig as EngineDecisionMatrixConfig;
use biovalidate_core::policy::HumanReviewTriggersConfig as EngineHumanReviewTriggersConfig;
use biovalidate_core::policy::PolicyEngineConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating the policy configuration.
#[derive(Debug, Error)]
pub enum PolicyConfigError {
    /// I/O failure while reading the configuration file.
    #[error("policy config io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("policy config parse error: {0}")]
    Parse(String),
    /// One or more fields failed validation; every problem found is listed.
    #[error("invalid policy config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// ============================================================================
// SECTION: Decision Matrix
// ============================================================================

/// Thresholds driving the accept / conditional-accept / reject decision.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DecisionMatrixConfig {
    /// Minimum critical-issue count that forces `rejected`.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: u64,
    /// Minimum error-issue count that forces `rejected`.
    #[serde(default = "default_error_threshold")]
    pub error_threshold: u64,
    /// Minimum warning-issue count that forces `conditional_accept`.
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: u64,
}

impl Default for DecisionMatrixConfig {
    fn default() -> Self {
        Self {
            critical_threshold: default_critical_threshold(),
            error_threshold: default_error_threshold(),
            warning_threshold: default_warning_threshold(),
        }
    }
}

/// Default `critical_threshold`: a single critical issue forces rejection.
const fn default_critical_threshold() -> u64 {
    1
}

/// Default `error_threshold`.
const fn default_error_threshold() -> u64 {
    5
}

/// Default `warning_threshold`.
const fn default_warning_threshold() -> u64 {
    10
}

impl DecisionMatrixConfig {
    /// Appends one message per out-of-range field to `errors`.
    fn validate(&self, errors: &mut Vec<String>) {
        if self.critical_threshold == 0 {
            errors.push("policy.decision_matrix.critical_threshold must be at least 1".to_string());
        }
        if self.error_threshold == 0 {
            errors.push("policy.decision_matrix.error_threshold must be at least 1".to_string());
        }
        if self.warning_threshold == 0 {
            errors.push("policy.decision_matrix.warning_threshold must be at least 1".to_string());
        }
    }
}

// ============================================================================
// SECTION: Human Review Triggers
// ============================================================================

/// Thresholds driving the `requires_human_review` flag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct HumanReviewTriggersConfig {
    /// Trigger review whenever any critical issue is present.
    #[serde(default = "default_on_critical")]
    pub on_critical: bool,
    /// Trigger review when the error count reaches this threshold.
    #[serde(default = "default_error_count_threshold")]
    pub error_count_threshold: u64,
    /// Trigger review when the warning count reaches this threshold.
    #[serde(default = "default_warning_count_threshold")]
    pub warning_count_threshold: u64,
}

impl Default for HumanReviewTriggersConfig {
    fn default() -> Self {
        Self {
            on_critical: default_on_critical(),
            error_count_threshold: default_error_count_threshold(),
            warning_count_threshold: default_warning_count_threshold(),
        }
    }
}

/// Default `on_critical`: any critical issue triggers review.
const fn default_on_critical() -> bool {
    true
}

/// Default `error_count_threshold`.
const fn default_error_count_threshold() -> u64 {
    3
}

/// Default `warning_count_threshold`.
const fn default_warning_count_threshold() -> u64 {
    15
}

impl HumanReviewTriggersConfig {
    /// Appends one message per out-of-range field to `errors`.
    fn validate(&self, errors: &mut Vec<String>) {
        if self.error_count_threshold == 0 {
            errors.push(
                "policy.human_review_triggers.error_count_threshold must be at least 1".to_string(),
            );
        }
        if self.warning_count_threshold == 0 {
            errors.push(
                "policy.human_review_triggers.warning_count_threshold must be at least 1".to_string(),
            );
        }
    }
}

// ============================================================================
// SECTION: Policy Config
// ============================================================================

/// The policy configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Decision matrix thresholds.
    #[serde(default)]
    pub decision_matrix: DecisionMatrixConfig,
    /// Human-review trigger thresholds.
    #[serde(default)]
    pub human_review_triggers: HumanReviewTriggersConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            decision_matrix: DecisionMatrixConfig::default(),
            human_review_triggers: HumanReviewTriggersConfig::default(),
        }
    }
}

impl PolicyConfig {
    /// Parses a policy config document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyConfigError::Parse`] on malformed YAML, or
    /// [`PolicyConfigError::Invalid`] when validation fails.
    pub fn from_yaml(text: &str) -> Result<Self, PolicyConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| PolicyConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a policy config from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyConfigError::Io`] when the file cannot be read, or the
    /// parse/validation errors from [`PolicyConfig::from_yaml`].
    pub fn load(path: &Path) -> Result<Self, PolicyConfigError> {
        let text = fs::read_to_string(path).map_err(|err| PolicyConfigError::Io(err.to_string()))?;
        Self::from_yaml(&text)
    }

    /// Aggregates every validation problem; returns all of them at once
    /// rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyConfigError::Invalid`] carrying one message per problem.
    pub fn validate(&self) -> Result<(), PolicyConfigError> {
        let mut errors = Vec::new();
        self.decision_matrix.validate(&mut errors);
        self.human_review_triggers.validate(&mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PolicyConfigError::Invalid(errors))
        }
    }
}

// ============================================================================
// SECTION: Engine Conversion
// ============================================================================

impl From<&DecisionMatrixConfig> for EngineDecisionMatrixConfig {
    fn from(config: &DecisionMatrixConfig) -> Self {
        Self {
            critical_threshold: config.critical_threshold,
            error_threshold: config.error_threshold,
            warning_threshold: config.warning_threshold,
        }
    }
}

impl From<&HumanReviewTriggersConfig> for EngineHumanReviewTriggersConfig {
    fn from(config: &HumanReviewTriggersConfig) -> Self {
        Self {
            on_critical: config.on_critical,
            error_count_threshold: config.error_count_threshold,
            warning_count_threshold: config.warning_count_threshold,
        }
    }
}

impl From<&PolicyConfig> for PolicyEngineConfig {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            decision_matrix: (&config.decision_matrix).into(),
            human_review_triggers: (&config.human_review_triggers).into(),
        }
    }
}

impl From<PolicyConfig> for PolicyEngineConfig {
    fn from(config: PolicyConfig) -> Self {
        Self::from(&config)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "test-only assertions are permitted to panic"
)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PolicyConfig::default();
        assert_eq!(config.decision_matrix.critical_threshold, 1);
        assert_eq!(config.decision_matrix.error_threshold, 5);
        assert_eq!(config.decision_matrix.warning_threshold, 10);
        assert!(config.human_review_triggers.on_critical);
        assert_eq!(config.human_review_triggers.error_count_threshold, 3);
        assert_eq!(config.human_review_triggers.warning_count_threshold, 15);
    }

    #[test]
    fn empty_document_parses_to_defaults() {
        let config = PolicyConfig::from_yaml("{}").expect("parse");
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn rejects_zero_threshold() {
        let mut config = PolicyConfig::default();
        config.decision_matrix.critical_threshold = 0;
        let err = config.validate().expect_err("should reject zero threshold");
        match err {
            PolicyConfigError::Invalid(messages) => assert_eq!(messages.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn converts_into_the_engine_config_unchanged() {
        let config = PolicyConfig::default();
        let engine_config: PolicyEngineConfig = (&config).into();
        assert_eq!(engine_config.decision_matrix.critical_threshold, config.decision_matrix.critical_threshold);
        assert_eq!(engine_config.decision_matrix.error_threshold, config.decision_matrix.error_threshold);
        assert_eq!(engine_config.decision_matrix.warning_threshold, config.decision_matrix.warning_threshold);
        assert_eq!(engine_config.human_review_triggers.on_critical, config.human_review_triggers.on_critical);
        assert_eq!(
            engine_config.human_review_triggers.error_count_threshold,
            config.human_review_triggers.error_count_threshold
        );
        assert_eq!(
            engine_config.human_review_triggers.warning_count_threshold,
            config.human_review_triggers.warning_count_threshold
        );
    }
}
