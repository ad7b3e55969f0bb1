// biovalidate-core/src/validators/schema.rs
// ============================================================================
// Module: Schema Validator
// Description: Record-level structural and type checks per declared format tag.
// Purpose: Verify each record matches the format-specific structural contract
//          before any downstream stage interprets its fields.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! The schema stage is the first stage in the pipeline and the only one that
//! can halt everything downstream: an unrecognized format tag is `critical`
//! because no other validator knows how to interpret the table. Per-record
//! structural problems (missing fields, bad alphabets) are `error` but do not
//! remove the offending rows — they stay in the table so later stages can
//! still report on whatever is interpretable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::model::DatasetMetadata;
use crate::model::FormatTag;
use crate::model::Issue;
use crate::model::Severity;
use crate::model::Table;
use crate::model::Value;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the schema stage over `table`, dispatching on `metadata`'s format tag.
///
/// Returns issues in the order they are discovered; an unrecognized format
/// tag short-circuits the rest of this function since no per-format contract
/// applies.
#[must_use]
pub fn run_schema(table: &Table, metadata: &DatasetMetadata) -> Vec<Issue> {
    let Some(format) = metadata.format_tag() else {
        return vec![Issue::table_level(
            Severity::Critical,
            "SCHEMA_000",
            format!("unrecognized format tag \"{}\"", metadata.format),
        )];
    };

    match format {
        FormatTag::GuideRna => check_guide_rna(table),
        FormatTag::VariantAnnotation => check_variant_annotation(table),
        FormatTag::SampleMetadata => check_sample_metadata(table),
    }
}

// ============================================================================
// SECTION: guide_rna Contract
// ============================================================================

/// Fields the `guide_rna` structural contract requires on every row.
const GUIDE_RNA_REQUIRED: [&str; 6] =
    ["guide_id", "sequence", "pam_sequence", "target_gene", "organism", "nuclease_type"];

/// Runs the `guide_rna` structural contract over `table`.
fn check_guide_rna(table: &Table) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(missing_required_fields(table, &GUIDE_RNA_REQUIRED));

    let mut bad_alphabet_rows = Vec::new();
    let mut empty_sequence_rows = Vec::new();
    let mut bad_pam_rows = Vec::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        let Some(sequence) = row.get("sequence").and_then(Value::as_str) else { continue };
        let upper = sequence.to_uppercase();
        if upper.is_empty() {
            empty_sequence_rows.push(row_idx);
        } else if !upper.chars().all(|base| matches!(base, 'A' | 'C' | 'G' | 'T' | 'N')) {
            bad_alphabet_rows.push(row_idx);
        }

        let pam = row.get("pam_sequence").and_then(Value::as_str);
        let nuclease = row.get("nuclease_type").and_then(Value::as_str);
        if let (Some(pam), Some(nuclease)) = (pam, nuclease)
            && !pam_matches_nuclease(pam, nuclease)
        {
            bad_pam_rows.push(row_idx);
        }
    }

    if !empty_sequence_rows.is_empty() {
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_001",
            "sequence",
            "sequence must not be empty",
            empty_sequence_rows,
        ));
    }
    if !bad_alphabet_rows.is_empty() {
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_002",
            "sequence",
            "sequence contains characters outside the {A,C,G,T,N} alphabet",
            bad_alphabet_rows,
        ));
    }
    if !bad_pam_rows.is_empty() {
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_003",
            "pam_sequence",
            "pam_sequence does not match the declared nuclease's PAM pattern",
            bad_pam_rows,
        ));
    }
    issues
}

/// Returns true if `pam` matches the PAM pattern for `nuclease`.
///
/// An unrecognized nuclease type is not judged here; that is a bio-rule
/// concern. This function only evaluates the three recognized nucleases.
#[must_use]
fn pam_matches_nuclease(pam: &str, nuclease: &str) -> bool {
    let upper = pam.to_uppercase();
    match nuclease {
        "SpCas9" => matches_pattern(&upper, b"NGG"),
        "SaCas9" => matches_pattern(&upper, b"NNGRRT"),
        "Cas12a" => matches_pattern(&upper, b"TTTV"),
        _ => true,
    }
}

/// Matches a sequence against a PAM pattern using the IUPAC-lite alphabet
/// `N` (any), `R` (A or G), `V` (A, C, or G) alongside literal bases.
fn matches_pattern(sequence: &str, pattern: &[u8]) -> bool {
    let bytes: Vec<u8> = sequence.bytes().collect();
    if bytes.len() != pattern.len() {
        return false;
    }
    bytes.iter().zip(pattern.iter()).all(|(&base, &symbol)| match symbol {
        b'N' => true,
        b'R' => matches!(base, b'A' | b'G'),
        b'V' => matches!(base, b'A' | b'C' | b'G'),
        literal => base == literal,
    })
}

// ============================================================================
// SECTION: variant_annotation Contract
// ============================================================================

/// Fields the `variant_annotation` structural contract requires on every row.
const VARIANT_ANNOTATION_REQUIRED: [&str; 4] = ["chromosome", "position", "ref_allele", "alt_allele"];
/// Characters a ref/alt allele string may contain.
const VALID_ALLELE_CHARS: [char; 6] = ['A', 'C', 'G', 'T', 'N', '-'];

/// Runs the `variant_annotation` structural contract over `table`.
fn check_variant_annotation(table: &Table) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(missing_required_fields(table, &VARIANT_ANNOTATION_REQUIRED));

    let mut bad_position_rows = Vec::new();
    let mut bad_allele_rows = Vec::new();

    for (row_idx, row) in table.rows.iter().enumerate() {
        if let Some(value) = row.get("position")
            && !value.is_null()
        {
            let is_positive_integer =
                value.as_number().is_some_and(|n| n.fract() == 0.0 && n > 0.0);
            if !is_positive_integer {
                bad_position_rows.push(row_idx);
            }
        }

        for field in ["ref_allele", "alt_allele"] {
            if let Some(allele) = row.get(field).and_then(Value::as_str) {
                let upper = allele.to_uppercase();
                if upper.is_empty() || !upper.chars().all(|c| VALID_ALLELE_CHARS.contains(&c)) {
                    bad_allele_rows.push(row_idx);
                    break;
                }
            }
        }
    }

    if !bad_position_rows.is_empty() {
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_004",
            "position",
            "position must be a positive integer",
            bad_position_rows,
        ));
    }
    if !bad_allele_rows.is_empty() {
        bad_allele_rows.sort_unstable();
        bad_allele_rows.dedup();
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_005",
            "ref_allele",
            "allele must be non-empty over the {A,C,G,T,N,-} alphabet",
            bad_allele_rows,
        ));
    }
    issues
}

// ============================================================================
// SECTION: sample_metadata Contract
// ============================================================================

/// Fields the `sample_metadata` structural contract requires on every row.
const SAMPLE_METADATA_REQUIRED: [&str; 2] = ["sample_id", "organism"];

/// Runs the `sample_metadata` structural contract over `table`.
fn check_sample_metadata(table: &Table) -> Vec<Issue> {
    let mut issues = Vec::new();
    issues.extend(missing_required_fields(table, &SAMPLE_METADATA_REQUIRED));

    let mut seen = std::collections::HashMap::new();
    let mut duplicate_rows = Vec::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        if let Some(sample_id) = row.get("sample_id").and_then(Value::as_str) {
            if seen.contains_key(sample_id) {
                duplicate_rows.push(row_idx);
            } else {
                seen.insert(sample_id.to_string(), row_idx);
            }
        }
    }
    if !duplicate_rows.is_empty() {
        issues.push(Issue::for_field(
            Severity::Error,
            "SCHEMA_006",
            "sample_id",
            "sample_id must be unique within the dataset",
            duplicate_rows,
        ));
    }
    issues
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Emits one `error` issue per required field missing or null on any row.
fn missing_required_fields(table: &Table, required: &[&str]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for &field in required {
        let missing_rows: Vec<usize> = table
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_missing(field))
            .map(|(idx, _)| idx)
            .collect();
        if !missing_rows.is_empty() {
            issues.push(Issue::for_field(
                Severity::Error,
                "SCHEMA_REQUIRED",
                field,
                format!("required field \"{field}\" is missing or null"),
                missing_rows,
            ));
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn guide_row(guide_id: &str, sequence: &str, pam: &str, nuclease: &str) -> Record {
        let mut row = Record::new();
        row.insert("guide_id", guide_id);
        row.insert("sequence", sequence);
        row.insert("pam_sequence", pam);
        row.insert("target_gene", "BRCA1");
        row.insert("organism", "human");
        row.insert("nuclease_type", nuclease);
        row
    }

    fn metadata(format: &str) -> DatasetMetadata {
        DatasetMetadata {
            dataset_id: "ds1".to_string(),
            format: format.to_string(),
            record_count: 0,
            organism: None,
            experiment_type: None,
            reference_genome: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn unknown_format_tag_is_critical() {
        let table = Table::new(vec![]);
        let issues = run_schema(&table, &metadata("unknown_format"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].rule_id, "SCHEMA_000");
    }

    #[test]
    fn valid_guide_rna_row_has_no_issues() {
        let mut table =
            Table::new(vec!["guide_id", "sequence", "pam_sequence"].into_iter().map(String::from).collect());
        table.rows.push(guide_row("g1", "ATCGATCGATCGATCGATCG", "AGG", "SpCas9"));
        let issues = run_schema(&table, &metadata("guide_rna"));
        assert!(issues.is_empty());
    }

    #[test]
    fn invalid_pam_is_flagged() {
        let mut table = Table::new(vec![]);
        table.rows.push(guide_row("g1", "ATCGATCGATCGATCGATCG", "AAA", "SpCas9"));
        let issues = run_schema(&table, &metadata("guide_rna"));
        assert!(issues.iter().any(|i| i.rule_id == "SCHEMA_003"));
    }

    #[test]
    fn missing_required_field_is_error_with_row_index() {
        let mut table = Table::new(vec![]);
        let mut row = guide_row("g1", "ATCGATCGATCGATCGATCG", "AGG", "SpCas9");
        row.insert("target_gene", crate::model::Value::Null);
        table.rows.push(row);
        let issues = run_schema(&table, &metadata("guide_rna"));
        let missing = issues.iter().find(|i| i.rule_id == "SCHEMA_REQUIRED").expect("missing issue");
        assert_eq!(missing.affected_rows, vec![0]);
        assert_eq!(missing.severity, Severity::Error);
    }

    #[test]
    fn duplicate_sample_id_is_flagged() {
        let mut table = Table::new(vec![]);
        for _ in 0..2 {
            let mut row = Record::new();
            row.insert("sample_id", "s1");
            row.insert("organism", "human");
            table.rows.push(row);
        }
        let issues = run_schema(&table, &metadata("sample_metadata"));
        assert!(issues.iter().any(|i| i.rule_id == "SCHEMA_006"));
    }
}
