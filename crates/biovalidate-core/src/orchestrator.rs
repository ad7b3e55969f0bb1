// biovalidate-core/src/orchestrator.rs
// ============================================================================
// Module: Validation Orchestrator
// Description: Staged pipeline coordinator with short-circuit rules,
//              concurrent bio stages, timeout containment, and report assembly.
// Purpose: The single entry point a host calls to validate a dataset.
// Dependencies: crate::{model, interfaces, validators, policy}, tokio
// ============================================================================

//! ## Overview
//! [`Orchestrator::validate`] is the only entry point a host needs. It never
//! raises for data-driven failures — those become [`crate::model::Issue`]
//! records — and only returns [`OrchestratorError`] for conditions outside the
//! pipeline's control (a validator task that cannot be joined at all). Timeouts
//! and per-stage panics are contained and reported inline, matching the
//! corpus's containment-at-the-boundary posture for its control plane.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use serde_json::Map;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::hashing::short_digest;
use crate::interfaces::BioLookupProvider;
use crate::interfaces::IdentifierKind;
use crate::interfaces::LookupOutcome;
use crate::interfaces::LookupRequest;
use crate::interfaces::LookupStatus;
use crate::model::DatasetMetadata;
use crate::model::Issue;
use crate::model::RulesetMetadata;
use crate::model::Severity;
use crate::model::StageName;
use crate::model::StageResult;
use crate::model::Table;
use crate::model::Timestamp;
use crate::model::ValidationReport;
use crate::model::Value;
use crate::policy::PolicyEngine;
use crate::validators;
use crate::validators::bio_rules::BioRuleConfig;
use crate::validators::rules::RuleEngineConfig;

// ============================================================================
// SECTION: Options
// ============================================================================

/// Per-run orchestrator options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Overall wall-clock deadline for the whole run.
    pub overall_timeout: Duration,
    /// Whether `critical`/`error` issues at schema, and `critical` issues at
    /// rules, are allowed to halt remaining stages.
    pub short_circuit_enabled: bool,
    /// Whether `bio_rules` and `bio_lookups` run concurrently rather than
    /// sequentially.
    pub parallel_bio_enabled: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(300),
            short_circuit_enabled: true,
            parallel_bio_enabled: true,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors the orchestrator itself can raise, distinct from data-driven
/// findings (which always become [`Issue`] records instead).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// A stage task could not be joined at all (the async runtime itself
    /// failed to schedule or complete it). This never happens for ordinary
    /// validator panics, which are contained and reported as `internal_error`
    /// issues instead.
    #[error("internal orchestrator failure: {0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Lookup Column Configuration
// ============================================================================

/// Declares a table column whose values should be resolved against an
/// external identifier provider, and which kind of identifier it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupColumnConfig {
    /// Column carrying the identifier to resolve.
    pub column: String,
    /// Which external system the identifier belongs to.
    pub kind: IdentifierKind,
}

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Sequences the validation pipeline and assembles the final report.
pub struct Orchestrator {
    rule_engine_config: RuleEngineConfig,
    bio_rule_config: BioRuleConfig,
    policy_engine: PolicyEngine,
    ruleset_metadata: RulesetMetadata,
    lookup_provider: Arc<dyn BioLookupProvider>,
    lookup_columns: Vec<LookupColumnConfig>,
}

/// Process-wide counter mixed into each validation run's generated ID so that
/// concurrent runs starting in the same instant still get distinct IDs.
static VALIDATION_COUNTER: AtomicU64 = AtomicU64::new(0);

impl Orchestrator {
    /// Builds an orchestrator from pre-loaded, pre-validated configuration.
    ///
    /// Configuration loading and validation (YAML parsing, threshold bounds
    /// checking) happens in `biovalidate-config` before this call; by the
    /// time an [`Orchestrator`] exists, a `ConfigError` can no longer occur.
    #[must_use]
    pub fn new(
        rule_engine_config: RuleEngineConfig,
        bio_rule_config: BioRuleConfig,
        policy_engine: PolicyEngine,
        ruleset_metadata: RulesetMetadata,
        lookup_provider: Arc<dyn BioLookupProvider>,
        lookup_columns: Vec<LookupColumnConfig>,
    ) -> Self {
        Self {
            rule_engine_config,
            bio_rule_config,
            policy_engine,
            ruleset_metadata,
            lookup_provider,
            lookup_columns,
        }
    }

    /// Runs the full staged pipeline over `table`/`metadata` and returns a
    /// single [`ValidationReport`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] only when the async runtime itself
    /// cannot complete a stage task; every data-driven or timeout condition
    /// is instead encoded in the returned report.
    pub async fn validate(
        &self,
        table: &Table,
        metadata: &DatasetMetadata,
        options: &OrchestratorOptions,
    ) -> Result<ValidationReport, OrchestratorError> {
        let validation_id = Self::generate_validation_id(&metadata.dataset_id);
        let started_at = Instant::now();
        let deadline = started_at + options.overall_timeout;

        let mut stages = Vec::new();
        let mut short_circuited = false;
        let mut timed_out = false;

        let schema_result =
            Self::run_blocking_stage(StageName::Schema, table.clone(), metadata.clone(), |table, metadata| {
                validators::run_schema(&table, &metadata)
            })
            .await?;
        let schema_halts = options.short_circuit_enabled && has_at_least_error(&schema_result);
        stages.push(schema_result);

        if schema_halts {
            short_circuited = true;
        } else if Instant::now() >= deadline {
            timed_out = true;
        } else {
            let rule_engine_config = self.rule_engine_config.clone();
            let rules_result = Self::run_blocking_stage(
                StageName::Rules,
                table.clone(),
                metadata.clone(),
                move |table, _metadata| validators::run_rules(&table, &rule_engine_config),
            )
            .await?;
            let rules_halts = options.short_circuit_enabled && rules_result.has_critical();
            stages.push(rules_result);

            if rules_halts {
                short_circuited = true;
            } else if Instant::now() >= deadline {
                timed_out = true;
            } else {
                let remaining = deadline.saturating_duration_since(Instant::now());
                let (bio_rules_result, bio_lookups_result, bio_timed_out) =
                    self.run_bio_stages(table, metadata, options, remaining).await?;
                timed_out |= bio_timed_out;
                stages.push(bio_rules_result);
                stages.push(bio_lookups_result);
            }
        }

        let timeout_issues = if timed_out {
            vec![Issue::table_level(
                Severity::Warning,
                "timeout",
                "overall validation deadline was exceeded; returning partial results",
            )]
        } else {
            Vec::new()
        };

        let policy_start = Instant::now();
        let mut stages_for_policy = stages.clone();
        stages_for_policy.push(StageResult::new(StageName::Policy, timeout_issues.clone(), 0));
        let outcome = self.policy_engine.evaluate(&stages_for_policy);
        let policy_elapsed = policy_start.elapsed();

        let mut policy_metadata = Map::new();
        policy_metadata.insert("critical_count".to_string(), JsonValue::from(outcome.counts.critical));
        policy_metadata.insert("error_count".to_string(), JsonValue::from(outcome.counts.error));
        policy_metadata.insert("warning_count".to_string(), JsonValue::from(outcome.counts.warning));
        policy_metadata.insert("info_count".to_string(), JsonValue::from(outcome.counts.info));
        stages.push(
            StageResult::new(StageName::Policy, timeout_issues, millis_u64(policy_elapsed))
                .with_metadata(policy_metadata),
        );

        let execution_time_seconds = started_at.elapsed().as_secs_f64();
        Ok(ValidationReport {
            validation_id,
            dataset_id: metadata.dataset_id.clone(),
            timestamp: Timestamp::now(),
            final_decision: outcome.decision,
            rationale: outcome.rationale,
            requires_human_review: outcome.requires_human_review,
            execution_time_seconds,
            short_circuited,
            stages,
            ruleset_metadata: self.ruleset_metadata.clone(),
            api_configuration: self.lookup_provider.api_configuration(),
        })
    }

    // ========================================================================
    // SECTION: Bio Stages
    // ========================================================================

    /// Runs `bio_rules` and `bio_lookups` either concurrently or sequentially
    /// depending on `options`, and reports whether either one hit the deadline.
    async fn run_bio_stages(
        &self,
        table: &Table,
        metadata: &DatasetMetadata,
        options: &OrchestratorOptions,
        remaining: Duration,
    ) -> Result<(StageResult, StageResult, bool), OrchestratorError> {
        if options.parallel_bio_enabled {
            let bio_rule_config = self.bio_rule_config.clone();
            let bio_rules_future = Self::run_blocking_stage(
                StageName::BioRules,
                table.clone(),
                metadata.clone(),
                move |table, metadata| validators::run_bio_rules(&table, &metadata, &bio_rule_config),
            );
            let bio_lookups_future = self.run_bio_lookups_stage(table, metadata, remaining);
            let (bio_rules_result, bio_lookups_result) = tokio::join!(bio_rules_future, bio_lookups_future);
            let bio_rules_result = bio_rules_result?;
            let (bio_lookups_result, lookups_timed_out) = bio_lookups_result?;
            Ok((bio_rules_result, bio_lookups_result, lookups_timed_out))
        } else {
            let bio_rule_config = self.bio_rule_config.clone();
            let bio_rules_result = Self::run_blocking_stage(
                StageName::BioRules,
                table.clone(),
                metadata.clone(),
                move |table, metadata| validators::run_bio_rules(&table, &metadata, &bio_rule_config),
            )
            .await?;
            let (bio_lookups_result, lookups_timed_out) =
                self.run_bio_lookups_stage(table, metadata, remaining).await?;
            Ok((bio_rules_result, bio_lookups_result, lookups_timed_out))
        }
    }

    /// Extracts identifier lookups from declared columns and resolves them
    /// through the injected provider, bounded by `remaining`. A timeout here
    /// yields an empty issue list plus `true`, leaving the run to report
    /// partial results rather than fail outright.
    async fn run_bio_lookups_stage(
        &self,
        table: &Table,
        metadata: &DatasetMetadata,
        remaining: Duration,
    ) -> Result<(StageResult, bool), OrchestratorError> {
        let start = Instant::now();
        let requests = self.extract_lookup_requests(table, metadata);

        if requests.is_empty() {
            return Ok((StageResult::new(StageName::BioLookups, Vec::new(), millis_u64(start.elapsed())), false));
        }

        match tokio::time::timeout(remaining, self.lookup_provider.resolve_batch(&requests)).await {
            Ok(Ok(batch)) => {
                let issues = lookup_issues_from_outcomes(&batch.outcomes);
                let stage_metadata = lookup_stage_metadata(&batch.outcomes, batch.cache_hits, batch.cache_misses, batch.failovers);
                Ok((
                    StageResult::new(StageName::BioLookups, issues, millis_u64(start.elapsed()))
                        .with_metadata(stage_metadata),
                    false,
                ))
            }
            Ok(Err(err)) => {
                let issue = Issue::table_level(
                    Severity::Critical,
                    "internal_error",
                    format!("bio_lookups stage failed: {err}"),
                );
                Ok((StageResult::new(StageName::BioLookups, vec![issue], millis_u64(start.elapsed())), false))
            }
            Err(_elapsed) => {
                Ok((StageResult::new(StageName::BioLookups, Vec::new(), millis_u64(start.elapsed())), true))
            }
        }
    }

    /// Builds one [`LookupRequest`] per distinct `(organism, identifier)` pair
    /// found across the declared lookup columns, case-folded for dedup.
    fn extract_lookup_requests(&self, table: &Table, metadata: &DatasetMetadata) -> Vec<LookupRequest> {
        let mut requests = Vec::new();
        let mut seen: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();

        for lookup_column in &self.lookup_columns {
            let Some(values) = (table.has_column(&lookup_column.column)).then(|| table.column_values(&lookup_column.column)) else {
                continue;
            };
            for (row, value) in values.into_iter().enumerate() {
                let Some(identifier) = value.and_then(Value::as_str) else { continue };
                let organism = table
                    .rows
                    .get(row)
                    .and_then(|record| record.get("organism"))
                    .and_then(Value::as_str)
                    .or(metadata.organism.as_deref())
                    .unwrap_or("unknown");
                let dedup_key = (organism.to_lowercase(), identifier.to_lowercase());
                if !seen.insert(dedup_key) {
                    continue;
                }
                requests.push(LookupRequest {
                    row,
                    organism: organism.to_string(),
                    kind: lookup_column.kind,
                    identifier: identifier.to_string(),
                });
            }
        }
        requests
    }

    // ========================================================================
    // SECTION: Stage Execution Helper
    // ========================================================================

    /// Runs a CPU-bound validator on a blocking worker thread and contains any
    /// panic as a synthetic `critical`-severity `internal_error` issue rather
    /// than letting it unwind across the task boundary.
    async fn run_blocking_stage(
        stage_name: StageName,
        table: Table,
        metadata: DatasetMetadata,
        validator: impl FnOnce(Table, DatasetMetadata) -> Vec<Issue> + Send + 'static,
    ) -> Result<StageResult, OrchestratorError> {
        let start = Instant::now();
        let join_result = tokio::task::spawn_blocking(move || {
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| validator(table, metadata)))
        })
        .await;
        let elapsed = millis_u64(start.elapsed());

        let issues = match join_result {
            Ok(Ok(issues)) => issues,
            Ok(Err(_panic)) => vec![Issue::table_level(
                Severity::Critical,
                "internal_error",
                format!("{} validator panicked", stage_name.as_str()),
            )],
            Err(join_error) => return Err(OrchestratorError::Internal(join_error.to_string())),
        };
        Ok(StageResult::new(stage_name, issues, elapsed))
    }

    /// Derives a deterministic, collision-resistant validation id from the
    /// dataset id, current time, and a process-local counter, rather than
    /// pulling in a UUID dependency for an opaque string the caller never
    /// needs to parse.
    fn generate_validation_id(dataset_id: &str) -> String {
        let counter = VALIDATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        let seed = format!("{dataset_id}:{}:{counter}", Timestamp::now());
        format!("val_{}", short_digest(seed.as_bytes()))
    }
}

// ============================================================================
// SECTION: Free Helpers
// ============================================================================

/// Returns true if any issue in `stage` has severity `error` or `critical`.
fn has_at_least_error(stage: &StageResult) -> bool {
    stage.issues.iter().any(|issue| issue.severity.is_at_least_error())
}

/// Converts a [`Duration`] to milliseconds, saturating instead of panicking
/// on the (practically unreachable) overflow case.
fn millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Converts per-identifier lookup outcomes into field-scoped issues, grouping
/// by status so each rule id is emitted at most once per stage.
fn lookup_issues_from_outcomes(outcomes: &[LookupOutcome]) -> Vec<Issue> {
    let mut not_found_rows = Vec::new();
    let mut degraded_rows = Vec::new();
    let mut ambiguous_rows = Vec::new();

    for outcome in outcomes {
        match outcome.status {
            LookupStatus::Confirmed => {}
            LookupStatus::NotFound => not_found_rows.push(outcome.row),
            LookupStatus::Degraded => degraded_rows.push(outcome.row),
            LookupStatus::Ambiguous => ambiguous_rows.push(outcome.row),
        }
    }

    let mut issues = Vec::new();
    if !not_found_rows.is_empty() {
        not_found_rows.sort_unstable();
        issues.push(Issue::for_field(
            Severity::Error,
            "LOOKUP_001",
            "identifier",
            "identifier was not found in any authoritative provider",
            not_found_rows,
        ));
    }
    if !ambiguous_rows.is_empty() {
        ambiguous_rows.sort_unstable();
        issues.push(Issue::for_field(
            Severity::Warning,
            "LOOKUP_002",
            "identifier",
            "provider returned multiple matches for this identifier",
            ambiguous_rows,
        ));
    }
    if !degraded_rows.is_empty() {
        degraded_rows.sort_unstable();
        issues.push(
            Issue::for_field(
                Severity::Warning,
                "LOOKUP_003",
                "identifier",
                "no provider could resolve this identifier due to an error (provider=degraded)",
                degraded_rows,
            )
            .with_metadata(Map::from_iter([("provider".to_string(), JsonValue::from("degraded"))])),
        );
    }
    issues
}

/// Summarizes a lookup batch into the `bio_lookups` stage metadata fields
/// surfaced on every report for reproducibility and operational visibility.
fn lookup_stage_metadata(
    outcomes: &[LookupOutcome],
    cache_hits: usize,
    cache_misses: usize,
    failovers: usize,
) -> Map<String, JsonValue> {
    let total_queries = outcomes.len().max(1);
    let ncbi_successes =
        outcomes.iter().filter(|o| o.source == "primary" && o.status != LookupStatus::Degraded).count();
    let ensembl_fallbacks = failovers;
    let degraded_mode = outcomes.iter().any(|o| o.status == LookupStatus::Degraded);
    let api_calls_made = outcomes.iter().filter(|o| o.source != "cache").count();
    let secondary_successes =
        outcomes.iter().filter(|o| o.source == "secondary" && o.status != LookupStatus::Degraded).count();

    #[allow(clippy::cast_precision_loss, reason = "lookup batch sizes are small in practice")]
    let cache_hit_rate = (cache_hits as f64 / total_queries as f64) * 100.0;
    #[allow(clippy::cast_precision_loss, reason = "lookup batch sizes are small in practice")]
    let provider_reliability = (ncbi_successes + secondary_successes) as f64 / total_queries as f64;

    let mut metadata = Map::new();
    metadata.insert("cache_hits".to_string(), JsonValue::from(cache_hits));
    metadata.insert("cache_misses".to_string(), JsonValue::from(cache_misses));
    metadata.insert("cache_hit_rate".to_string(), JsonValue::from(format!("{cache_hit_rate:.1}%")));
    metadata.insert("api_calls_made".to_string(), JsonValue::from(api_calls_made));
    metadata.insert("ncbi_successes".to_string(), JsonValue::from(ncbi_successes));
    metadata.insert("ensembl_fallbacks".to_string(), JsonValue::from(ensembl_fallbacks));
    metadata.insert("degraded_mode".to_string(), JsonValue::from(degraded_mode));
    metadata.insert("provider_reliability".to_string(), JsonValue::from(provider_reliability));
    metadata
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "test-only assertions are permitted to panic")]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::interfaces::LookupBatchResult;
    use crate::interfaces::LookupError;
    use crate::model::ApiConfiguration;
    use crate::model::Decision;
    use crate::model::Record;

    struct StubProvider {
        api_configuration: ApiConfiguration,
    }

    #[async_trait]
    impl BioLookupProvider for StubProvider {
        async fn resolve_batch(&self, requests: &[LookupRequest]) -> Result<LookupBatchResult, LookupError> {
            let outcomes = requests
                .iter()
                .map(|request| LookupOutcome {
                    row: request.row,
                    kind: request.kind,
                    identifier: request.identifier.clone(),
                    status: LookupStatus::Confirmed,
                    source: "primary".to_string(),
                })
                .collect();
            Ok(LookupBatchResult {
                outcomes,
                cache_hits: 0,
                cache_misses: requests.len(),
                failovers: 0,
                api_configuration: self.api_configuration.clone(),
            })
        }

        fn api_configuration(&self) -> ApiConfiguration {
            self.api_configuration.clone()
        }
    }

    fn stub_api_configuration() -> ApiConfiguration {
        ApiConfiguration {
            cache_enabled: true,
            secondary_provider_enabled: true,
            primary_rate_limit_per_sec: 10.0,
            secondary_rate_limit_per_sec: 15.0,
            cache_ttl_hours: 168,
        }
    }

    fn ruleset_metadata() -> RulesetMetadata {
        RulesetMetadata {
            version: "1.0.0".to_string(),
            last_updated: None,
            source: "rules.yaml".to_string(),
            hash: Some("abc123".to_string()),
            latest_changes: Vec::new(),
        }
    }

    fn metadata() -> DatasetMetadata {
        DatasetMetadata {
            dataset_id: "ds1".to_string(),
            format: "guide_rna".to_string(),
            record_count: 1,
            organism: Some("human".to_string()),
            experiment_type: None,
            reference_genome: None,
            tags: Vec::new(),
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            RuleEngineConfig {
                required_columns: vec![],
                ranges: vec![],
                relations: vec![],
                unique_columns: vec!["guide_id".to_string()],
                sequence_columns: vec![],
                near_duplicate_threshold: 0.95,
                categorical_columns: vec![],
                class_imbalance_threshold: 0.30,
                missing_value_threshold: 0.10,
            },
            BioRuleConfig::default(),
            PolicyEngine::default(),
            ruleset_metadata(),
            Arc::new(StubProvider { api_configuration: stub_api_configuration() }),
            vec![LookupColumnConfig { column: "target_gene".to_string(), kind: IdentifierKind::Gene }],
        )
    }

    fn clean_guide_table() -> Table {
        let mut table = Table::new(
            vec!["guide_id", "sequence", "pam_sequence", "target_gene", "organism", "nuclease_type"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let mut row = Record::new();
        row.insert("guide_id", "g1");
        row.insert("sequence", "ATCGATCGATCGATCGATCG");
        row.insert("pam_sequence", "AGG");
        row.insert("target_gene", "BRCA1");
        row.insert("organism", "human");
        row.insert("nuclease_type", "SpCas9");
        table.rows.push(row);
        table
    }

    #[tokio::test]
    async fn clean_record_is_accepted_with_no_issues() {
        let orchestrator = orchestrator();
        let table = clean_guide_table();
        let report = orchestrator.validate(&table, &metadata(), &OrchestratorOptions::default()).await.expect("report");
        assert_eq!(report.final_decision, Decision::Accepted);
        assert!(!report.requires_human_review);
        assert!(!report.short_circuited);
        let total_issues: usize = report.stages.iter().map(|s| s.issues.len()).sum();
        assert_eq!(total_issues, 0);
    }

    #[tokio::test]
    async fn unknown_format_short_circuits() {
        let orchestrator = orchestrator();
        let table = clean_guide_table();
        let mut bad_metadata = metadata();
        bad_metadata.format = "mystery_format".to_string();
        let report =
            orchestrator.validate(&table, &bad_metadata, &OrchestratorOptions::default()).await.expect("report");
        assert!(report.short_circuited);
        assert_eq!(report.final_decision, Decision::Rejected);
        assert!(report.stage(StageName::Rules).is_none());
        assert!(report.stage(StageName::BioRules).is_none());
    }

    #[tokio::test]
    async fn invalid_pam_short_circuits_at_schema_but_does_not_reject() {
        let orchestrator = orchestrator();
        let mut table = clean_guide_table();
        table.rows[0].insert("pam_sequence", "AAA");
        let report = orchestrator.validate(&table, &metadata(), &OrchestratorOptions::default()).await.expect("report");
        assert!(report.short_circuited);
        assert_eq!(report.final_decision, Decision::Accepted);
        let schema = report.stage(StageName::Schema).expect("schema stage");
        assert!(schema.issues.iter().any(|i| i.rule_id == "SCHEMA_003"));
        assert!(report.stage(StageName::BioRules).is_none());
    }

    #[tokio::test]
    async fn invalid_pam_surfaces_in_bio_rules_when_short_circuit_disabled() {
        let orchestrator = orchestrator();
        let mut table = clean_guide_table();
        table.rows[0].insert("pam_sequence", "AAA");
        let options =
            OrchestratorOptions { short_circuit_enabled: false, ..OrchestratorOptions::default() };
        let report = orchestrator.validate(&table, &metadata(), &options).await.expect("report");
        assert!(!report.short_circuited);
        let bio_rules = report.stage(StageName::BioRules).expect("bio_rules stage");
        assert!(bio_rules.issues.iter().any(|i| i.rule_id == "BIO_002"));
    }
}
