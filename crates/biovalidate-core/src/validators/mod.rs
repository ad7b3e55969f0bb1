// biovalidate-core/src/validators/mod.rs
// ============================================================================
// Module: Validators
// Description: Re-exports the per-stage validators invoked by the orchestrator.
// ============================================================================

pub mod bio_rules;
pub mod rules;
pub mod schema;

pub use bio_rules::run_bio_rules;
pub use rules::RuleEngineConfig;
pub use rules::run_rules;
pub use schema::run_schema;
