// biovalidate-core/src/validators/bio_rules.rs
// ============================================================================
// Module: Biological-Rule Engine
// Description: Domain-specific checks over sequences and annotations that do
//              not require any external data.
// Purpose: Catch CRISPR guide, variant, and sample-metadata problems that are
//          purely a function of the declared values themselves.
// Dependencies: crate::model, time
// ============================================================================

//! ## Overview
//! Each rule has a stable id, a fixed severity, and a decision procedure over
//! one column or a small set of columns. Column extraction happens once per
//! rule (not once per row re-scan); sequence scanning itself is necessarily
//! per-character, since that is the nature of the data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::format_description::well_known::Iso8601;

use crate::model::DatasetMetadata;
use crate::model::FormatTag;
use crate::model::Issue;
use crate::model::Severity;
use crate::model::Table;
use crate::model::Value;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Engine-facing configuration for the biological-rule stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BioRuleConfig {
    /// Field name carrying a sample's collection date, checked for RFC 3339
    /// date conformance when present on the table.
    pub collection_date_field: String,
    /// Allowed organism tags; empty means no restriction is enforced.
    pub allowed_organisms: Vec<String>,
}

impl Default for BioRuleConfig {
    fn default() -> Self {
        Self { collection_date_field: "collection_date".to_string(), allowed_organisms: Vec::new() }
    }
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Runs the biological-rule stage over `table`, dispatching on `metadata`'s
/// format tag. Tables whose format is unrecognized produce no issues here;
/// the schema stage already flagged that as `critical`.
#[must_use]
pub fn run_bio_rules(table: &Table, metadata: &DatasetMetadata, config: &BioRuleConfig) -> Vec<Issue> {
    match metadata.format_tag() {
        Some(FormatTag::GuideRna) => check_guide_rna(table),
        Some(FormatTag::VariantAnnotation) => check_variant_annotation(table),
        Some(FormatTag::SampleMetadata) => check_sample_metadata(table, config),
        None => Vec::new(),
    }
}

// ============================================================================
// SECTION: guide_rna Rules
// ============================================================================

/// Runs every `guide_rna` bio-rule over `table`.
fn check_guide_rna(table: &Table) -> Vec<Issue> {
    let sequences = table.column_values("sequence");
    let pams = table.column_values("pam_sequence");
    let nucleases = table.column_values("nuclease_type");

    let mut critically_short = Vec::new();
    let mut suboptimal_length = Vec::new();
    let mut invalid_pam = Vec::new();
    let mut gc_out_of_range = Vec::new();
    let mut poly_t = Vec::new();
    let mut homopolymer = Vec::new();
    let mut non_dna = Vec::new();
    let mut rna_confusion = Vec::new();

    for (idx, sequence) in sequences.iter().enumerate() {
        let Some(sequence) = sequence.and_then(Value::as_str) else { continue };
        let upper = sequence.to_uppercase();
        let len = upper.chars().count();

        if len < 15 {
            critically_short.push(idx);
        } else if !(19..=20).contains(&len) {
            suboptimal_length.push(idx);
        }

        if !upper.chars().all(|c| matches!(c, 'A' | 'C' | 'G' | 'T' | 'N')) {
            non_dna.push(idx);
        } else {
            let gc = gc_fraction(&upper);
            if !(0.40..=0.70).contains(&gc) {
                gc_out_of_range.push(idx);
            }
            if upper.contains("TTTT") {
                poly_t.push(idx);
            }
            if has_homopolymer_run(&upper, 5) {
                homopolymer.push(idx);
            }
        }

        if sequence.to_uppercase().contains('U') {
            rna_confusion.push(idx);
        }

        let pam = pams.get(idx).and_then(|v| v.and_then(Value::as_str));
        let nuclease = nucleases.get(idx).and_then(|v| v.and_then(Value::as_str));
        if let (Some(pam), Some(nuclease)) = (pam, nuclease)
            && !pam_matches_nuclease(pam, nuclease)
        {
            invalid_pam.push(idx);
        }
    }

    let mut issues = Vec::new();
    push_rows(&mut issues, Severity::Error, "BIO_001A", "sequence", "guide is critically short (< 15 nt)", critically_short);
    push_rows(&mut issues, Severity::Warning, "BIO_001B", "sequence", "guide length is outside the optimal 19-20 nt window", suboptimal_length);
    push_rows(&mut issues, Severity::Error, "BIO_002", "pam_sequence", "PAM does not match the declared nuclease's pattern", invalid_pam);
    push_rows(&mut issues, Severity::Warning, "BIO_003", "sequence", "GC content is outside the 0.40-0.70 range", gc_out_of_range);
    push_rows(&mut issues, Severity::Warning, "BIO_004", "sequence", "sequence contains a poly-T stretch (transcription-termination risk)", poly_t);
    push_rows(&mut issues, Severity::Warning, "BIO_005", "sequence", "sequence contains a homopolymer run of 5 or more bases", homopolymer);
    push_rows(&mut issues, Severity::Error, "BIO_006", "sequence", "sequence contains a character outside {A,C,G,T,N}", non_dna);
    push_rows(&mut issues, Severity::Warning, "BIO_007", "sequence", "sequence contains \"U\" (RNA/DNA confusion)", rna_confusion);
    issues
}

/// Fraction of G/C bases in an uppercased sequence.
fn gc_fraction(upper_sequence: &str) -> f64 {
    let len = upper_sequence.chars().count();
    if len == 0 {
        return 0.0;
    }
    let gc_count = upper_sequence.chars().filter(|c| matches!(c, 'G' | 'C')).count();
    #[allow(clippy::cast_precision_loss, reason = "guide lengths are small in practice")]
    {
        gc_count as f64 / len as f64
    }
}

/// True if `upper_sequence` contains a run of the same base at least `run_length` long.
fn has_homopolymer_run(upper_sequence: &str, run_length: usize) -> bool {
    let mut current_char = None;
    let mut current_run = 0usize;
    for c in upper_sequence.chars() {
        if Some(c) == current_char {
            current_run += 1;
        } else {
            current_char = Some(c);
            current_run = 1;
        }
        if current_run >= run_length {
            return true;
        }
    }
    false
}

/// Mirrors the schema validator's PAM pattern check; kept independent here
/// since a bio-rule violation and a schema violation are reported as
/// separate stages with separate rule ids, matching the spec's per-rule
/// table for §4.4 distinct from §4.2's per-format contract.
fn pam_matches_nuclease(pam: &str, nuclease: &str) -> bool {
    let upper = pam.to_uppercase();
    match nuclease {
        "SpCas9" => matches_pattern(&upper, b"NGG"),
        "SaCas9" => matches_pattern(&upper, b"NNGRRT"),
        "Cas12a" => matches_pattern(&upper, b"TTTV"),
        _ => true,
    }
}

/// True if `sequence` matches `pattern`, where `N`/`R`/`V` are IUPAC wildcards.
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
// SECTION: variant_annotation Rules
// ============================================================================

/// Runs every `variant_annotation` bio-rule over `table`.
fn check_variant_annotation(table: &Table) -> Vec<Issue> {
    let mut issues = Vec::new();

    let chromosomes = table.column_values("chromosome");
    let mut bad_chromosome = Vec::new();
    for (idx, value) in chromosomes.into_iter().enumerate() {
        if let Some(chromosome) = value.and_then(Value::as_str)
            && !is_recognized_chromosome(chromosome)
        {
            bad_chromosome.push(idx);
        }
    }
    push_rows(&mut issues, Severity::Warning, "BIO_101", "chromosome", "unrecognized chromosome prefix", bad_chromosome);

    if table.has_column("allele_frequency") {
        let frequencies = table.column_values("allele_frequency");
        let mut bad_frequency = Vec::new();
        for (idx, value) in frequencies.into_iter().enumerate() {
            if let Some(frequency) = value.and_then(Value::as_number)
                && !(0.0..=1.0).contains(&frequency)
            {
                bad_frequency.push(idx);
            }
        }
        push_rows(&mut issues, Severity::Error, "BIO_102", "allele_frequency", "allele frequency must lie in [0.0, 1.0]", bad_frequency);
    }

    let refs = table.column_values("ref_allele");
    let alts = table.column_values("alt_allele");
    let mut identical = Vec::new();
    for (idx, (r, a)) in refs.iter().zip(alts.iter()).enumerate() {
        if let (Some(r), Some(a)) = (r.and_then(Value::as_str), a.and_then(Value::as_str))
            && r.eq_ignore_ascii_case(a)
        {
            identical.push(idx);
        }
    }
    push_rows(&mut issues, Severity::Warning, "BIO_103", "ref_allele", "ref_allele and alt_allele are identical (no-op variant)", identical);

    issues
}

/// True if `raw` (optionally `chr`-prefixed) names a human chromosome 1-22, X, Y, or MT.
fn is_recognized_chromosome(raw: &str) -> bool {
    let upper = raw.to_uppercase();
    let body = upper.strip_prefix("CHR").unwrap_or(&upper);
    match body {
        "X" | "Y" | "M" | "MT" => true,
        numeric => numeric.parse::<u8>().is_ok_and(|n| (1..=22).contains(&n)),
    }
}

// ============================================================================
// SECTION: sample_metadata Rules
// ============================================================================

/// Runs every `sample_metadata` bio-rule over `table`.
fn check_sample_metadata(table: &Table, config: &BioRuleConfig) -> Vec<Issue> {
    let mut issues = Vec::new();

    if table.has_column(&config.collection_date_field) {
        let dates = table.column_values(&config.collection_date_field);
        let mut malformed = Vec::new();
        for (idx, value) in dates.into_iter().enumerate() {
            if let Some(raw) = value.and_then(Value::as_str)
                && Date::parse(raw, &Iso8601::DATE).is_err()
            {
                malformed.push(idx);
            }
        }
        push_rows(
            &mut issues,
            Severity::Warning,
            "BIO_201",
            config.collection_date_field.clone(),
            "collection date does not parse as an RFC 3339 date",
            malformed,
        );
    }

    if !config.allowed_organisms.is_empty() {
        let organisms = table.column_values("organism");
        let mut unrecognized = Vec::new();
        for (idx, value) in organisms.into_iter().enumerate() {
            if let Some(organism) = value.and_then(Value::as_str)
                && !config.allowed_organisms.iter().any(|allowed| allowed.eq_ignore_ascii_case(organism))
            {
                unrecognized.push(idx);
            }
        }
        push_rows(&mut issues, Severity::Warning, "BIO_202", "organism", "organism tag is not in the configured allowlist", unrecognized);
    }

    issues
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Appends one issue covering `rows`, or nothing if `rows` is empty.
fn push_rows(
    issues: &mut Vec<Issue>,
    severity: Severity,
    rule_id: &str,
    field: impl Into<String>,
    message: &str,
    rows: Vec<usize>,
) {
    if !rows.is_empty() {
        issues.push(Issue::for_field(severity, rule_id, field, message, rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Record;

    fn guide_row(sequence: &str, pam: &str, nuclease: &str) -> Record {
        let mut row = Record::new();
        row.insert("sequence", sequence);
        row.insert("pam_sequence", pam);
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
    fn critically_short_guide_is_error() {
        let mut table = Table::new(vec![]);
        table.rows.push(guide_row("ATCGATCG", "AGG", "SpCas9"));
        let issues = run_bio_rules(&table, &metadata("guide_rna"), &BioRuleConfig::default());
        assert!(issues.iter().any(|i| i.rule_id == "BIO_001A" && i.severity == Severity::Error));
    }

    #[test]
    fn optimal_length_guide_has_no_length_issue() {
        let mut table = Table::new(vec![]);
        table.rows.push(guide_row("ATCGATCGATCGATCGATCG", "AGG", "SpCas9"));
        let issues = run_bio_rules(&table, &metadata("guide_rna"), &BioRuleConfig::default());
        assert!(!issues.iter().any(|i| i.rule_id.starts_with("BIO_001")));
    }

    #[test]
    fn poly_t_stretch_is_flagged() {
        let mut table = Table::new(vec![]);
        table.rows.push(guide_row("ATCGATCGATTTTTCGATCG", "AGG", "SpCas9"));
        let issues = run_bio_rules(&table, &metadata("guide_rna"), &BioRuleConfig::default());
        assert!(issues.iter().any(|i| i.rule_id == "BIO_004"));
    }

    #[test]
    fn rna_confusion_is_flagged() {
        let mut table = Table::new(vec![]);
        table.rows.push(guide_row("AUCGAUCGAUCGAUCGAUCG", "AGG", "SpCas9"));
        let issues = run_bio_rules(&table, &metadata("guide_rna"), &BioRuleConfig::default());
        assert!(issues.iter().any(|i| i.rule_id == "BIO_007"));
    }

    #[test]
    fn recognized_chromosome_prefixes() {
        assert!(is_recognized_chromosome("chr1"));
        assert!(is_recognized_chromosome("X"));
        assert!(is_recognized_chromosome("MT"));
        assert!(!is_recognized_chromosome("chrZZ"));
    }

    #[test]
    fn identical_ref_alt_is_flagged() {
        let mut table = Table::new(vec![]);
        let mut row = Record::new();
        row.insert("ref_allele", "A");
        row.insert("alt_allele", "a");
        table.rows.push(row);
        let issues = run_bio_rules(&table, &metadata("variant_annotation"), &BioRuleConfig::default());
        assert!(issues.iter().any(|i| i.rule_id == "BIO_103"));
    }
}
