// biovalidate-core/src/validators/rules.rs
// ============================================================================
// Module: Vectorized Rule Engine
// Description: Bulk tabular consistency, duplicate, and bias checks.
// Purpose: Express set-at-a-time operations over column vectors rather than
//          per-row loops, per the corpus's comparator-style bulk evaluation.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! Every check in this module scans each relevant column once and emits at
//! most one issue per rule (duplicate groups aside, which emit one issue per
//! group). The engine is deliberately config-driven and knows nothing about
//! YAML; [`RuleEngineConfig`] is populated by `biovalidate-config` from the
//! rules document and handed in by value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use crate::model::Issue;
use crate::model::Severity;
use crate::model::Table;
use crate::model::Value;

// ============================================================================
// SECTION: Config
// ============================================================================

/// A closed numeric range rule over one column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeRule {
    /// Column the range applies to.
    pub column: String,
    /// Inclusive minimum.
    pub min: f64,
    /// Inclusive maximum.
    pub max: f64,
}

/// A cross-column relational predicate, e.g. `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

impl RelationOperator {
    /// Evaluates this operator over `left` and `right`.
    const fn holds(self, left: f64, right: f64) -> bool {
        match self {
            Self::LessThan => left < right,
            Self::LessThanOrEqual => left <= right,
            Self::GreaterThan => left > right,
            Self::GreaterThanOrEqual => left >= right,
            Self::Equal => left == right,
        }
    }
}

/// A declarative cross-column relation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRule {
    /// Left-hand column.
    pub left: String,
    /// Relational operator.
    pub operator: RelationOperator,
    /// Right-hand column.
    pub right: String,
}

/// Engine-facing configuration for the vectorized rule stage, assembled by
/// `biovalidate-config` from the rules document.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleEngineConfig {
    /// Columns that must be present on the table.
    pub required_columns: Vec<String>,
    /// Value-range rules.
    pub ranges: Vec<RangeRule>,
    /// Cross-column relation rules.
    pub relations: Vec<RelationRule>,
    /// Columns whose values must be unique across the table.
    pub unique_columns: Vec<String>,
    /// Sequence columns subject to near-duplicate detection.
    pub sequence_columns: Vec<String>,
    /// Normalized edit-distance threshold above which a pair is near-duplicate.
    pub near_duplicate_threshold: f64,
    /// Declared categorical columns subject to class-imbalance checks.
    pub categorical_columns: Vec<String>,
    /// Minority-class share below which an imbalance warning is emitted.
    pub class_imbalance_threshold: f64,
    /// Null fraction above which a missing-value warning is emitted.
    pub missing_value_threshold: f64,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs every vectorized consistency/duplicate/bias check over `table`.
///
/// An empty table short-circuits to a single informational `warning`
/// (`empty_dataset`) rather than running every check against zero rows.
#[must_use]
pub fn run_rules(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    if table.is_empty() {
        return vec![Issue::table_level(
            Severity::Warning,
            "empty_dataset",
            "the dataset contains zero rows",
        )];
    }

    let mut issues = Vec::new();
    issues.extend(check_required_columns(table, config));
    issues.extend(check_ranges(table, config));
    issues.extend(check_relations(table, config));
    issues.extend(check_exact_duplicates(table, config));
    issues.extend(check_identifier_duplicates(table, config));
    issues.extend(check_near_duplicate_sequences(table, config));
    issues.extend(check_class_imbalance(table, config));
    issues.extend(check_missing_value_bias(table, config));
    issues
}

// ============================================================================
// SECTION: Required Columns
// ============================================================================

/// Flags every column named in `config.required_columns` that `table` lacks.
fn check_required_columns(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    config
        .required_columns
        .iter()
        .filter(|column| !table.has_column(column))
        .map(|column| {
            Issue::table_level(
                Severity::Error,
                "RULES_001",
                format!("required column \"{column}\" is missing from the table"),
            )
        })
        .collect()
}

// ============================================================================
// SECTION: Value Ranges
// ============================================================================

/// Flags values falling outside each configured `[min, max]` column range.
fn check_ranges(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for rule in &config.ranges {
        let mut out_of_range = Vec::new();
        for (idx, value) in table.column_values(&rule.column).into_iter().enumerate() {
            if let Some(number) = value.and_then(Value::as_number)
                && !(rule.min..=rule.max).contains(&number)
            {
                out_of_range.push(idx);
            }
        }
        if !out_of_range.is_empty() {
            issues.push(Issue::for_field(
                Severity::Error,
                "RULES_002",
                rule.column.clone(),
                format!("value outside the configured range [{}, {}]", rule.min, rule.max),
                out_of_range,
            ));
        }
    }
    issues
}

// ============================================================================
// SECTION: Cross-Column Relations
// ============================================================================

/// Flags rows violating a configured cross-column numeric relation.
fn check_relations(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for rule in &config.relations {
        let left_values = table.column_values(&rule.left);
        let right_values = table.column_values(&rule.right);
        let mut violations = Vec::new();
        for (idx, (left, right)) in left_values.iter().zip(right_values.iter()).enumerate() {
            if let (Some(left), Some(right)) =
                (left.and_then(Value::as_number), right.and_then(Value::as_number))
                && !rule.operator.holds(left, right)
            {
                violations.push(idx);
            }
        }
        if !violations.is_empty() {
            issues.push(Issue::table_level(
                Severity::Error,
                "RULES_003",
                format!("rows violate the relation \"{} / {}\"", rule.left, rule.right),
            ).with_rows(violations));
        }
    }
    issues
}

// ============================================================================
// SECTION: Exact Row Duplicates
// ============================================================================

/// Flags row groups that are exact duplicates across every non-identifier column.
fn check_exact_duplicates(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let identifier_columns: std::collections::HashSet<&str> =
        config.unique_columns.iter().map(String::as_str).collect();
    let comparison_columns: Vec<&str> = table
        .columns
        .iter()
        .map(String::as_str)
        .filter(|column| !identifier_columns.contains(column))
        .collect();

    let mut groups: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let key: Vec<String> = comparison_columns
            .iter()
            .map(|column| row.get(column).map(Value::canonical_string).unwrap_or_default())
            .collect();
        groups.entry(key).or_default().push(idx);
    }

    let mut issues = Vec::new();
    let mut duplicate_groups: Vec<Vec<usize>> =
        groups.into_values().filter(|rows| rows.len() >= 2).collect();
    duplicate_groups.sort_by_key(|rows| rows[0]);
    for rows in duplicate_groups {
        issues.push(
            Issue::table_level(
                Severity::Warning,
                "DUP_003",
                format!("{} rows are exact duplicates across non-identifier columns", rows.len()),
            )
            .with_rows(rows),
        );
    }
    issues
}

// ============================================================================
// SECTION: Identifier Duplicates
// ============================================================================

/// Flags duplicate values in each column configured as unique.
fn check_identifier_duplicates(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for column in &config.unique_columns {
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut duplicate_rows = Vec::new();
        for (idx, value) in table.column_values(column).into_iter().enumerate() {
            let Some(value) = value else { continue };
            let key = value.canonical_string();
            if seen.contains_key(&key) {
                duplicate_rows.push(idx);
            } else {
                seen.insert(key, idx);
            }
        }
        if !duplicate_rows.is_empty() {
            issues.push(Issue::for_field(
                Severity::Error,
                "DUP_001",
                column.clone(),
                format!("column \"{column}\" must be unique but contains duplicate values"),
                duplicate_rows,
            ));
        }
    }
    issues
}

// ============================================================================
// SECTION: Near-Duplicate Sequences
// ============================================================================

/// Detects near-duplicate sequence pairs using length-bucketing: only rows
/// whose sequence length falls within the tolerance implied by the threshold
/// are compared, which keeps the check far cheaper than the naive O(N²) scan
/// while still catching every pair the threshold would flag (two sequences
/// of very different length can never clear a high similarity threshold).
fn check_near_duplicate_sequences(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for column in &config.sequence_columns {
        let values: Vec<(usize, String)> = table
            .column_values(column)
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| value.and_then(Value::as_str).map(|s| (idx, s.to_uppercase())))
            .collect();

        let mut buckets: HashMap<usize, Vec<(usize, &str)>> = HashMap::new();
        for (idx, sequence) in &values {
            buckets.entry(sequence.len()).or_default().push((*idx, sequence.as_str()));
        }

        let mut flagged_rows = std::collections::BTreeSet::new();
        for bucket in buckets.values() {
            for i in 0..bucket.len() {
                for j in (i + 1)..bucket.len() {
                    let (row_a, seq_a) = bucket[i];
                    let (row_b, seq_b) = bucket[j];
                    if normalized_similarity(seq_a, seq_b) >= config.near_duplicate_threshold {
                        flagged_rows.insert(row_a);
                        flagged_rows.insert(row_b);
                    }
                }
            }
        }

        if !flagged_rows.is_empty() {
            issues.push(Issue::for_field(
                Severity::Warning,
                "DUP_002",
                column.clone(),
                format!(
                    "sequences are near-duplicates (normalized similarity >= {})",
                    config.near_duplicate_threshold
                ),
                flagged_rows.into_iter().collect(),
            ));
        }
    }
    issues
}

/// Returns `1.0 - (edit_distance / max(len_a, len_b))`, i.e. the fraction of
/// characters two equal-length-class sequences have in common under a Levenshtein
/// alignment. Sequences of equal length (the only case length-bucketing admits)
/// reduce to a straightforward DP; the general form is kept for robustness.
fn normalized_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(a, b);
    #[allow(clippy::cast_precision_loss, reason = "sequence lengths are small in practice")]
    {
        1.0 - (distance as f64 / max_len as f64)
    }
}

/// Classic Levenshtein edit distance, computed with a two-row DP table.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j] + cost).min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

// ============================================================================
// SECTION: Class Imbalance
// ============================================================================

/// Flags categorical columns whose minority class share falls below threshold.
fn check_class_imbalance(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    for column in &config.categorical_columns {
        let values: Vec<String> = table
            .column_values(column)
            .into_iter()
            .filter_map(|value| value.map(Value::canonical_string))
            .collect();
        if values.is_empty() {
            continue;
        }
        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in &values {
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
        #[allow(clippy::cast_precision_loss, reason = "row counts are small in practice")]
        let minority_share = counts.values().copied().min().unwrap_or(0) as f64 / values.len() as f64;
        if counts.len() >= 2 && minority_share < config.class_imbalance_threshold {
            issues.push(Issue::table_level(
                Severity::Warning,
                "BIAS_001",
                format!(
                    "column \"{column}\" shows class imbalance: minority share {minority_share:.3} < threshold {}",
                    config.class_imbalance_threshold
                ),
            ));
        }
    }
    issues
}

// ============================================================================
// SECTION: Missing-Value Bias
// ============================================================================

/// Flags columns whose missing-value fraction exceeds threshold, escalating to
/// `error` when the missingness correlates with a categorical column.
fn check_missing_value_bias(table: &Table, config: &RuleEngineConfig) -> Vec<Issue> {
    let mut issues = Vec::new();
    let row_count = table.len();
    if row_count == 0 {
        return issues;
    }
    for column in &table.columns {
        let values = table.column_values(column);
        let missing_rows: Vec<usize> =
            values.iter().enumerate().filter(|(_, v)| v.is_none()).map(|(idx, _)| idx).collect();
        #[allow(clippy::cast_precision_loss, reason = "row counts are small in practice")]
        let missing_fraction = missing_rows.len() as f64 / row_count as f64;
        if missing_fraction <= config.missing_value_threshold {
            continue;
        }

        let severity = config
            .categorical_columns
            .iter()
            .find(|candidate| candidate.as_str() != column)
            .is_some_and(|candidate| missingness_correlates(table, column, candidate))
            .then_some(Severity::Error)
            .unwrap_or(Severity::Warning);

        issues.push(Issue::for_field(
            severity,
            "BIAS_002",
            column.clone(),
            format!("column \"{column}\" has missing fraction {missing_fraction:.3} > threshold {}", config.missing_value_threshold),
            missing_rows,
        ));
    }
    issues
}

/// A simple frequency-split correlation test: splits rows into
/// missing/present groups for `target_column` and compares each group's
/// distribution over `categorical_column`. A large divergence in the
/// dominant category's share between the two groups is treated as
/// correlation, standing in for a full chi-squared test.
fn missingness_correlates(table: &Table, target_column: &str, categorical_column: &str) -> bool {
    let target_values = table.column_values(target_column);
    let categorical_values = table.column_values(categorical_column);

    let mut missing_group: HashMap<String, usize> = HashMap::new();
    let mut present_group: HashMap<String, usize> = HashMap::new();
    let mut missing_total = 0usize;
    let mut present_total = 0usize;

    for (target, category) in target_values.iter().zip(categorical_values.iter()) {
        let Some(category) = category.map(Value::canonical_string) else { continue };
        if target.is_none() {
            *missing_group.entry(category).or_insert(0) += 1;
            missing_total += 1;
        } else {
            *present_group.entry(category).or_insert(0) += 1;
            present_total += 1;
        }
    }

    if missing_total == 0 || present_total == 0 {
        return false;
    }

    #[allow(clippy::cast_precision_loss, reason = "row counts are small in practice")]
    let dominant_share = |group: &HashMap<String, usize>, total: usize| -> f64 {
        group.values().copied().max().unwrap_or(0) as f64 / total as f64
    };

    let missing_dominant = dominant_share(&missing_group, missing_total);
    let present_dominant = dominant_share(&present_group, present_total);
    (missing_dominant - present_dominant).abs() > 0.25
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn config() -> RuleEngineConfig {
        RuleEngineConfig {
            required_columns: vec!["guide_id".to_string()],
            ranges: vec![],
            relations: vec![],
            unique_columns: vec!["guide_id".to_string()],
            sequence_columns: vec!["sequence".to_string()],
            near_duplicate_threshold: 0.95,
            categorical_columns: vec![],
            class_imbalance_threshold: 0.30,
            missing_value_threshold: 0.10,
        }
    }

    fn row(guide_id: &str, sequence: &str) -> Record {
        let mut row = Record::new();
        row.insert("guide_id", guide_id);
        row.insert("sequence", sequence);
        row
    }

    #[test]
    fn empty_table_yields_single_warning() {
        let table = Table::new(vec!["guide_id".to_string()]);
        let issues = run_rules(&table, &config());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, "empty_dataset");
    }

    #[test]
    fn missing_required_column_is_table_level_error() {
        let mut table = Table::new(vec!["other".to_string()]);
        table.rows.push(row("g1", "ATCG"));
        let issues = run_rules(&table, &config());
        assert!(issues.iter().any(|i| i.rule_id == "RULES_001" && i.severity == Severity::Error));
    }

    #[test]
    fn identifier_duplicates_are_flagged() {
        let mut table = Table::new(vec!["guide_id".to_string(), "sequence".to_string()]);
        table.rows.push(row("g1", "ATCGATCGATCG"));
        table.rows.push(row("g1", "TTTTCCCCGGGG"));
        let issues = run_rules(&table, &config());
        let dup = issues.iter().find(|i| i.rule_id == "DUP_001").expect("dup issue");
        assert_eq!(dup.affected_rows, vec![1]);
    }

    #[test]
    fn exact_duplicates_excluding_identifier_column_are_flagged() {
        let mut table = Table::new(vec!["guide_id".to_string(), "sequence".to_string()]);
        table.rows.push(row("g1", "ATCGATCGATCG"));
        table.rows.push(row("g2", "ATCGATCGATCG"));
        let issues = run_rules(&table, &config());
        let dup = issues.iter().find(|i| i.rule_id == "DUP_003").expect("dup issue");
        assert_eq!(dup.affected_rows, vec![0, 1]);
    }

    #[test]
    fn near_duplicate_sequences_are_flagged() {
        let mut cfg = config();
        cfg.unique_columns.clear();
        let mut table = Table::new(vec!["guide_id".to_string(), "sequence".to_string()]);
        table.rows.push(row("g1", "ATCGATCGATCGATCGATCG"));
        table.rows.push(row("g2", "ATCGATCGATCGATCGATCC"));
        let issues = run_rules(&table, &cfg);
        assert!(issues.iter().any(|i| i.rule_id == "DUP_002"));
    }

    #[test]
    fn levenshtein_distance_matches_known_values() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
    }
}
