// biovalidate-config/src/rules_config.rs
// ============================================================================
// Module: Rules Configuration
// Description: Typed model and validation for the rules YAML document.
// Purpose: Drive the vectorized rule engine and bio-rule engine from one file.
// Dependencies: biovalidate-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! The rules config declares required columns, value ranges, cross-column
//! relations, duplicate/bias thresholds, and a changelog used to populate the
//! report's `ruleset_metadata`. Validation aggregates every problem found in
//! one pass rather than failing on the first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use biovalidate_core::RulesetMetadata;
use biovalidate_core::hashing::short_digest;
use biovalidate_core::validators::rules::RangeRule as EngineRangeRule;
use biovalidate_core::validators::rules::RelationOperator as EngineRelationOperator;
use biovalidate_core::validators::rules::RelationRule as EngineRelationRule;
use biovalidate_core::validators::rules::RuleEngineConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading or validating the rules configuration.
#[derive(Debug, Error)]
pub enum RulesConfigError {
    /// I/O failure while reading the configuration file.
    #[error("rules config io error: {0}")]
    Io(String),
    /// YAML parsing error.
    #[error("rules config parse error: {0}")]
    Parse(String),
    /// One or more fields failed validation; every problem found is listed.
    #[error("invalid rules config: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

// ============================================================================
// SECTION: Changelog
// ============================================================================

/// A single changelog entry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChangelogEntry {
    /// Semver version this entry describes.
    pub version: String,
    /// ISO-8601 date string.
    pub date: String,
    /// Short free-form descriptions of what changed.
    #[serde(default)]
    pub changes: Vec<String>,
}

// ============================================================================
// SECTION: Consistency / Duplicate / Bias Sections
// ============================================================================

/// A closed numeric range rule over one column.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RangeRule {
    /// Column the range applies to.
    pub column: String,
    /// Inclusive minimum.
    pub min: f64,
    /// Inclusive maximum.
    pub max: f64,
}

impl From<&RangeRule> for EngineRangeRule {
    fn from(rule: &RangeRule) -> Self {
        Self { column: rule.column.clone(), min: rule.min, max: rule.max }
    }
}

/// A cross-column relational predicate, e.g. `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationOperator {
    /// Left strictly less than right.
    LessThan,
    /// Left less than or equal to right.
    LessThanOrEqual,
    /// Left strictly greater than right.
    GreaterThan,
    /// Left greater than or equal to right.
    GreaterThanOrEqual,
    /// Left equal to right.
    Equal,
}

impl From<RelationOperator> for EngineRelationOperator {
    fn from(operator: RelationOperator) -> Self {
        match operator {
            RelationOperator::LessThan => Self::LessThan,
            RelationOperator::LessThanOrEqual => Self::LessThanOrEqual,
            RelationOperator::GreaterThan => Self::GreaterThan,
            RelationOperator::GreaterThanOrEqual => Self::GreaterThanOrEqual,
            RelationOperator::Equal => Self::Equal,
        }
    }
}

/// A declarative cross-column relation rule.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RelationRule {
    /// Left-hand column.
    pub left: String,
    /// Relational operator.
    pub operator: RelationOperator,
    /// Right-hand column.
    pub right: String,
}

impl From<&RelationRule> for EngineRelationRule {
    fn from(rule: &RelationRule) -> Self {
        Self { left: rule.left.clone(), operator: rule.operator.into(), right: rule.right.clone() }
    }
}

/// The `consistency` section of the rules config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConsistencyRules {
    /// Columns that must be present on the table.
    #[serde(default)]
    pub required_columns: Vec<String>,
    /// Value-range rules.
    #[serde(default)]
    pub ranges: Vec<RangeRule>,
    /// Cross-column relation rules.
    #[serde(default)]
    pub relations: Vec<RelationRule>,
}

impl ConsistencyRules {
    /// Appends one message per malformed range or relation to `errors`.
    fn validate(&self, errors: &mut Vec<String>) {
        for (idx, range) in self.ranges.iter().enumerate() {
            if range.min > range.max {
                errors.push(format!(
                    "rules.consistency.ranges[{idx}]: min ({}) exceeds max ({})",
                    range.min, range.max
                ));
            }
            if range.column.trim().is_empty() {
                errors.push(format!("rules.consistency.ranges[{idx}]: column must not be empty"));
            }
        }
        for (idx, relation) in self.relations.iter().enumerate() {
            if relation.left.trim().is_empty() || relation.right.trim().is_empty() {
                errors.push(format!(
                    "rules.consistency.relations[{idx}]: left and right columns must not be empty"
                ));
            }
        }
    }
}

/// The `duplicates` section of the rules config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DuplicateRules {
    /// Columns whose values must be unique across the table.
    #[serde(default)]
    pub unique_columns: Vec<String>,
    /// Sequence columns subject to near-duplicate detection.
    #[serde(default)]
    pub sequence_columns: Vec<String>,
    /// Normalized edit-distance threshold above which a pair is near-duplicate.
    #[serde(default = "default_near_duplicate_threshold")]
    pub near_duplicate_threshold: f64,
}

impl Default for DuplicateRules {
    fn default() -> Self {
        Self {
            unique_columns: Vec::new(),
            sequence_columns: Vec::new(),
            near_duplicate_threshold: default_near_duplicate_threshold(),
        }
    }
}

impl DuplicateRules {
    /// Appends a message to `errors` if the threshold is outside `[0.0, 1.0]`.
    fn validate(&self, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.near_duplicate_threshold) {
            errors.push(format!(
                "rules.duplicates.near_duplicate_threshold ({}) must be in [0.0, 1.0]",
                self.near_duplicate_threshold
            ));
        }
    }
}

/// Default `near_duplicate_threshold`.
const fn default_near_duplicate_threshold() -> f64 {
    0.95
}

/// The `bias` section of the rules config.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BiasRules {
    /// Declared categorical columns subject to class-imbalance checks.
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    /// Minority-class share below which an imbalance warning is emitted.
    #[serde(default = "default_class_imbalance_threshold")]
    pub class_imbalance_threshold: f64,
    /// Null fraction above which a missing-value warning is emitted.
    #[serde(default = "default_missing_value_threshold")]
    pub missing_value_threshold: f64,
}

impl Default for BiasRules {
    fn default() -> Self {
        Self {
            categorical_columns: Vec::new(),
            class_imbalance_threshold: default_class_imbalance_threshold(),
            missing_value_threshold: default_missing_value_threshold(),
        }
    }
}

impl BiasRules {
    /// Appends a message to `errors` for each threshold outside `[0.0, 1.0]`.
    fn validate(&self, errors: &mut Vec<String>) {
        if !(0.0..=1.0).contains(&self.class_imbalance_threshold) {
            errors.push(format!(
                "rules.bias.class_imbalance_threshold ({}) must be in [0.0, 1.0]",
                self.class_imbalance_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.missing_value_threshold) {
            errors.push(format!(
                "rules.bias.missing_value_threshold ({}) must be in [0.0, 1.0]",
                self.missing_value_threshold
            ));
        }
    }
}

/// Default `class_imbalance_threshold`.
const fn default_class_imbalance_threshold() -> f64 {
    0.30
}

/// Default `missing_value_threshold`.
const fn default_missing_value_threshold() -> f64 {
    0.10
}

/// Catch-all for deployment-specific rules not modeled by name; carried as
/// opaque JSON so unrecognized extensions round-trip without data loss.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CustomRules(#[serde(default)] pub BTreeMap<String, serde_json::Value>);

/// The `rules` section of the rules config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleSections {
    /// Consistency rules (required columns, ranges, relations).
    #[serde(default)]
    pub consistency: ConsistencyRules,
    /// Duplicate-detection rules.
    #[serde(default)]
    pub duplicates: DuplicateRules,
    /// Bias-detection rules.
    #[serde(default)]
    pub bias: BiasRules,
    /// Deployment-specific extensions.
    #[serde(default)]
    pub custom: CustomRules,
}

// ============================================================================
// SECTION: Rules Config
// ============================================================================

/// The rules configuration document.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Semver version string.
    pub version: Option<String>,
    /// Date the version was last updated.
    pub last_updated: Option<String>,
    /// Changelog, newest entry first.
    #[serde(default)]
    pub changelog: Vec<ChangelogEntry>,
    /// The rule sections proper.
    #[serde(default)]
    pub rules: RuleSections,
}

impl RulesConfig {
    /// Parses a rules config document from YAML text.
    ///
    /// # Errors
    ///
    /// Returns [`RulesConfigError::Parse`] on malformed YAML, or
    /// [`RulesConfigError::Invalid`] when validation fails.
    pub fn from_yaml(text: &str) -> Result<Self, RulesConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|err| RulesConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a rules config from disk, returning both the
    /// parsed document and the [`RulesetMetadata`] computed over its raw
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RulesConfigError::Io`] when the file cannot be read, or the
    /// parse/validation errors from [`RulesConfig::from_yaml`].
    pub fn load(path: &Path) -> Result<(Self, RulesetMetadata), RulesConfigError> {
        let bytes = fs::read(path).map_err(|err| RulesConfigError::Io(err.to_string()))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|err| RulesConfigError::Io(format!("rules config must be utf-8: {err}")))?;
        let config = Self::from_yaml(text)?;
        let metadata = config.ruleset_metadata(path, &bytes);
        Ok((config, metadata))
    }

    /// Aggregates every validation problem; returns all of them at once
    /// rather than stopping at the first.
    ///
    /// # Errors
    ///
    /// Returns [`RulesConfigError::Invalid`] carrying one message per problem.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        let mut errors = Vec::new();
        self.rules.consistency.validate(&mut errors);
        self.rules.duplicates.validate(&mut errors);
        self.rules.bias.validate(&mut errors);
        if let Some(version) = &self.version
            && semver_is_malformed(version)
        {
            errors.push(format!("version \"{version}\" is not a valid semver string"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(RulesConfigError::Invalid(errors))
        }
    }

    /// Builds the [`RuleEngineConfig`] the vectorized rule engine runs
    /// against, flattening the three declarative sections into the engine's
    /// flat, serde-agnostic shape.
    #[must_use]
    pub fn rule_engine_config(&self) -> RuleEngineConfig {
        RuleEngineConfig {
            required_columns: self.rules.consistency.required_columns.clone(),
            ranges: self.rules.consistency.ranges.iter().map(Into::into).collect(),
            relations: self.rules.consistency.relations.iter().map(Into::into).collect(),
            unique_columns: self.rules.duplicates.unique_columns.clone(),
            sequence_columns: self.rules.duplicates.sequence_columns.clone(),
            near_duplicate_threshold: self.rules.duplicates.near_duplicate_threshold,
            categorical_columns: self.rules.bias.categorical_columns.clone(),
            class_imbalance_threshold: self.rules.bias.class_imbalance_threshold,
            missing_value_threshold: self.rules.bias.missing_value_threshold,
        }
    }

    /// Builds the report-facing [`RulesetMetadata`] for this document.
    ///
    /// A document with no declared `version` is not treated as an error; its
    /// identity is reported as `"unknown"` with no hash, per the informational
    /// posture of this field.
    fn ruleset_metadata(&self, path: &Path, bytes: &[u8]) -> RulesetMetadata {
        let source = path.display().to_string();
        let Some(version) = self.version.clone() else {
            return RulesetMetadata {
                version: "unknown".to_string(),
                last_updated: None,
                source,
                hash: None,
                latest_changes: Vec::new(),
            };
        };
        let latest_changes =
            self.changelog.first().map(|entry| entry.changes.clone()).unwrap_or_default();
        RulesetMetadata {
            version,
            last_updated: self.last_updated.clone(),
            source,
            hash: Some(short_digest(bytes)),
            latest_changes,
        }
    }
}

/// A minimal semver shape check: `MAJOR.MINOR.PATCH` with numeric components.
fn semver_is_malformed(version: &str) -> bool {
    let parts: Vec<_> = version.split('.').collect();
    parts.len() != 3 || parts.iter().any(|part| part.parse::<u64>().is_err())
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

    const SAMPLE: &str = r"
version: 1.2.0
last_updated: 2026-01-15
changelog:
  - version: 1.2.0
    date: 2026-01-15
    changes:
      - Raised GC content warning threshold
rules:
  consistency:
    required_columns: [guide_id, sequence]
    ranges:
      - column: gc_content
        min: 0.0
        max: 1.0
  duplicates:
    unique_columns: [guide_id]
    near_duplicate_threshold: 0.95
  bias:
    categorical_columns: [nuclease_type]
";

    #[test]
    fn parses_well_formed_document() {
        let config = RulesConfig::from_yaml(SAMPLE).expect("parse");
        assert_eq!(config.version.as_deref(), Some("1.2.0"));
        assert_eq!(config.rules.consistency.required_columns, vec!["guide_id", "sequence"]);
    }

    #[test]
    fn rejects_inverted_range() {
        let mut config = RulesConfig::from_yaml(SAMPLE).expect("parse");
        config.rules.consistency.ranges[0].min = 2.0;
        let err = config.validate().expect_err("should reject inverted range");
        match err {
            RulesConfigError::Invalid(messages) => assert_eq!(messages.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rule_engine_config_flattens_the_declarative_sections() {
        let config = RulesConfig::from_yaml(SAMPLE).expect("parse");
        let engine_config = config.rule_engine_config();
        assert_eq!(engine_config.required_columns, vec!["guide_id", "sequence"]);
        assert_eq!(engine_config.ranges.len(), 1);
        assert_eq!(engine_config.ranges[0].column, "gc_content");
        assert_eq!(engine_config.unique_columns, vec!["guide_id"]);
        assert_eq!(engine_config.near_duplicate_threshold, 0.95);
        assert_eq!(engine_config.categorical_columns, vec!["nuclease_type"]);
    }

    #[test]
    fn missing_version_yields_unknown_metadata() {
        let config = RulesConfig::from_yaml("rules: {}").expect("parse");
        let metadata = config.ruleset_metadata(Path::new("rules.yaml"), b"rules: {}");
        assert_eq!(metadata.version, "unknown");
        assert!(metadata.hash.is_none());
    }
}
