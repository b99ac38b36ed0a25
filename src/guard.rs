//! SQL Guard
//!
//! Preflight pipeline run before a generated query reaches the database:
//! quote normalization, statement safety scan, then semantic validation of
//! the plan. Every stage runs, so the report lists all problems at once.

use crate::config::GuardConfig;
use crate::error::Result;
use crate::execution_loop::error_classifier::{ClassifiedError, ErrorClassifier, ErrorText};
use crate::execution_loop::error_recovery::ErrorRecovery;
use crate::intent::finalized_plan::FinalizedPlan;
use crate::security::policy::{AllowAllTables, TableAllowList, TablePolicy};
use crate::semantic::loader::load_from_file;
use crate::semantic::registry::SemanticRegistry;
use crate::validation::quote_normalizer::normalize_quotes;
use crate::validation::semantic_validator::{SemanticValidation, SemanticValidator};
use crate::validation::statement_safety::scan_statement_safety;
use crate::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Combined preflight outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub normalized_sql: String,
    pub safety: ValidationResult,
    pub semantics: SemanticValidation,
    pub ok: bool,
}

impl PreflightReport {
    /// Safety issues followed by semantic issues
    pub fn issues(&self) -> Vec<&str> {
        self.safety
            .issues
            .iter()
            .chain(&self.semantics.issues)
            .map(String::as_str)
            .collect()
    }
}

/// Preflight guard bound to one registry snapshot
pub struct SqlGuard {
    registry: Arc<SemanticRegistry>,
    policy: Arc<dyn TablePolicy>,
    classifier: ErrorClassifier,
    suggestion_threshold: f64,
}

impl SqlGuard {
    pub fn new(registry: Arc<SemanticRegistry>) -> Self {
        Self {
            registry,
            policy: Arc::new(AllowAllTables),
            classifier: ErrorClassifier::new(),
            suggestion_threshold: GuardConfig::default().suggestion_threshold,
        }
    }

    /// Build a guard from configuration, loading the registry if a path is set
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        let registry = match &config.registry_path {
            Some(path) => load_from_file(path)?,
            None => Arc::new(SemanticRegistry::new()),
        };

        let mut guard = Self::new(registry);
        guard.suggestion_threshold = config.suggestion_threshold;
        if let Some(tables) = &config.allowed_tables {
            guard.policy = Arc::new(TableAllowList::new(tables));
        }
        Ok(guard)
    }

    pub fn with_policy(mut self, policy: Arc<dyn TablePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &Arc<SemanticRegistry> {
        &self.registry
    }

    pub fn normalize(&self, sql: &str) -> String {
        normalize_quotes(sql, &self.registry)
    }

    pub fn scan(&self, sql: &str) -> ValidationResult {
        scan_statement_safety(sql)
    }

    pub fn validate(&self, plan: &FinalizedPlan, sql: &str) -> SemanticValidation {
        SemanticValidator::new(&self.registry, self.policy.as_ref()).validate(plan, sql)
    }

    /// Normalize, scan and validate a candidate query
    pub fn preflight(&self, plan: &FinalizedPlan, sql: &str) -> PreflightReport {
        let normalized_sql = self.normalize(sql);
        let safety = self.scan(&normalized_sql);
        let semantics = self.validate(plan, &normalized_sql);
        let ok = safety.ok && semantics.ok;

        info!(
            ok,
            safety_issues = safety.issues.len(),
            semantic_issues = semantics.issues.len(),
            "Preflight complete"
        );

        PreflightReport {
            normalized_sql,
            safety,
            semantics,
            ok,
        }
    }

    pub fn classify<E: ErrorText + ?Sized>(&self, error: &E) -> ClassifiedError {
        self.classifier.classify(error)
    }

    /// Repair guidance for a failed execution attempt
    pub fn recovery_prompt<E: ErrorText + ?Sized>(&self, error: &E, attempt: u8) -> String {
        let classified = self.classify(error);
        ErrorRecovery::new(Arc::clone(&self.registry))
            .with_similarity_threshold(self.suggestion_threshold)
            .build_recovery_prompt(&classified, attempt)
    }
}
