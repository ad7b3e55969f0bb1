// crates/biovalidate-core/tests/proptest_comparator.rs
// ============================================================================
// Module: Comparator Property-Based Tests
// Description: Property tests for the GC-content and near-duplicate-sequence
//              comparator-like routines that run in the hot path of the
//              biological-rule and vectorized rule engines.
// Purpose: Detect panics and invariant violations across wide input ranges
//          that a handful of hand-picked unit tests would not reach.
// ============================================================================

//! Property-based tests for the bio-rule and rule-engine comparator routines.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "test-only assertions are permitted to panic"
)]

use biovalidate_core::DatasetMetadata;
use biovalidate_core::Record;
use biovalidate_core::Severity;
use biovalidate_core::Table;
use biovalidate_core::validators::bio_rules::BioRuleConfig;
use biovalidate_core::validators::bio_rules::run_bio_rules;
use biovalidate_core::validators::rules::RuleEngineConfig;
use biovalidate_core::validators::rules::run_rules;
use proptest::prelude::*;

fn guide_metadata() -> DatasetMetadata {
    DatasetMetadata {
        dataset_id: "proptest".to_string(),
        format: "guide_rna".to_string(),
        record_count: 1,
        organism: None,
        experiment_type: None,
        reference_genome: None,
        tags: Vec::new(),
    }
}

fn dna_sequence_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('T'), Just('N')], min_len..=max_len)
        .prop_map(|chars| chars.into_iter().collect())
}

fn rule_engine_config() -> RuleEngineConfig {
    RuleEngineConfig {
        required_columns: vec![],
        ranges: vec![],
        relations: vec![],
        unique_columns: vec![],
        sequence_columns: vec!["sequence".to_string()],
        near_duplicate_threshold: 0.95,
        categorical_columns: vec![],
        class_imbalance_threshold: 0.30,
        missing_value_threshold: 0.10,
    }
}

proptest! {
    /// BIO_003 fires iff the GC fraction genuinely falls outside [0.40, 0.70];
    /// computed independently here from the raw base counts rather than by
    /// calling the engine's own private helper, so the test cannot pass by
    /// sharing a bug with the implementation.
    #[test]
    fn gc_content_rule_matches_an_independently_computed_fraction(
        sequence in dna_sequence_strategy(15, 40)
    ) {
        let gc_count = sequence.chars().filter(|c| matches!(c, 'G' | 'C')).count();
        #[allow(clippy::cast_precision_loss, reason = "proptest sequences are short")]
        let fraction = gc_count as f64 / sequence.len() as f64;
        let expect_out_of_range = !(0.40..=0.70).contains(&fraction);

        let mut table = Table::new(vec!["sequence".to_string(), "pam_sequence".to_string(), "nuclease_type".to_string()]);
        let mut row = Record::new();
        row.insert("sequence", sequence.as_str());
        row.insert("pam_sequence", "AGG");
        row.insert("nuclease_type", "SpCas9");
        table.rows.push(row);

        let issues = run_bio_rules(&table, &guide_metadata(), &BioRuleConfig::default());
        let flagged = issues.iter().any(|issue| issue.rule_id == "BIO_003");
        prop_assert_eq!(flagged, expect_out_of_range);
    }

    /// The bio-rule engine never panics regardless of sequence content,
    /// including characters outside the DNA alphabet (which should instead
    /// surface as BIO_006, not crash the stage).
    #[test]
    fn bio_rules_never_panics_on_arbitrary_text(sequence in ".{0,64}", pam in ".{0,12}") {
        let mut table = Table::new(vec!["sequence".to_string(), "pam_sequence".to_string(), "nuclease_type".to_string()]);
        let mut row = Record::new();
        row.insert("sequence", sequence.as_str());
        row.insert("pam_sequence", pam.as_str());
        row.insert("nuclease_type", "SpCas9");
        table.rows.push(row);

        let _ = run_bio_rules(&table, &guide_metadata(), &BioRuleConfig::default());
    }

    /// Two rows carrying byte-identical sequences always clear any
    /// near-duplicate threshold in (0.0, 1.0] and must be flagged by DUP_002.
    #[test]
    fn identical_sequences_always_trigger_near_duplicate_warning(
        sequence in dna_sequence_strategy(10, 30)
    ) {
        let mut table = Table::new(vec!["sequence".to_string()]);
        for _ in 0..2 {
            let mut row = Record::new();
            row.insert("sequence", sequence.as_str());
            table.rows.push(row);
        }
        let issues = run_rules(&table, &rule_engine_config());
        prop_assert!(issues.iter().any(|issue| issue.rule_id == "DUP_002" && issue.severity == Severity::Warning));
    }

    /// The rule engine never panics on arbitrary sequence columns of varying
    /// length, which exercises the length-bucketing path with many singleton
    /// buckets as well as large shared buckets.
    #[test]
    fn rule_engine_never_panics_on_arbitrary_sequences(
        sequences in prop::collection::vec(dna_sequence_strategy(0, 25), 0..12)
    ) {
        let mut table = Table::new(vec!["sequence".to_string()]);
        for sequence in sequences {
            let mut row = Record::new();
            row.insert("sequence", sequence.as_str());
            table.rows.push(row);
        }
        let _ = run_rules(&table, &rule_engine_config());
    }
}
