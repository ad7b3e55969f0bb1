// biovalidate-config/src/lib.rs
// ============================================================================
// Module: BioValidate Config Library
// Description: Canonical rules/policy configuration model and env resolution.
// Purpose: Single source of truth for rules.yaml / policy.yaml semantics.
// Dependencies: biovalidate-core, serde, serde_yaml
// ============================================================================

//! ## Overview
//! `biovalidate-config` loads and validates the two YAML documents that drive
//! a validation run (rules, policy), and resolves the recognized environment
//! knobs into a single typed [`env::EnvConfig`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod env;
pub mod policy_config;
pub mod rules_config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use env::EnvConfig;
pub use policy_config::DecisionMatrixConfig;
pub use policy_config::HumanReviewTriggersConfig;
pub use policy_config::PolicyConfig;
pub use policy_config::PolicyConfigError;
pub use rules_config::BiasRules;
pub use rules_config::ConsistencyRules;
pub use rules_config::DuplicateRules;
pub use rules_config::RangeRule;
pub use rules_config::RelationOperator;
pub use rules_config::RelationRule;
pub use rules_config::RuleSections;
pub use rules_config::RulesConfig;
pub use rules_config::RulesConfigError;
