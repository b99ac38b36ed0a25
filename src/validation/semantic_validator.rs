//! Semantic Validator
//!
//! Cross-checks a finalized plan against the registry: table policy, selected
//! entities, join edges, requested dimensions and metrics, and time range.
//! Issues are accumulated; nothing short-circuits.

use crate::intent::finalized_plan::{FieldPath, FieldRef, FinalizedPlan};
use crate::security::policy::TablePolicy;
use crate::semantic::entity::Entity;
use crate::semantic::registry::SemanticRegistry;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Result of semantic validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticValidation {
    pub ok: bool,
    pub semantic_ok: bool,
    pub issues: Vec<String>,
}

impl SemanticValidation {
    fn from_issues(issues: Vec<String>) -> Self {
        let ok = issues.is_empty();
        Self {
            ok,
            semantic_ok: ok,
            issues,
        }
    }
}

/// Which index a field reference is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldClass {
    Dimension,
    Metric,
}

impl FieldClass {
    fn label(&self) -> &'static str {
        match self {
            FieldClass::Dimension => "Dimension",
            FieldClass::Metric => "Metric",
        }
    }

    fn resolves(&self, entity: &Entity, field: &str) -> bool {
        match self {
            FieldClass::Dimension => entity.resolves_dimension(field),
            FieldClass::Metric => entity.resolves_measure(field),
        }
    }
}

/// Semantic validator bound to one registry snapshot and policy
pub struct SemanticValidator<'a> {
    registry: &'a SemanticRegistry,
    policy: &'a dyn TablePolicy,
}

impl<'a> SemanticValidator<'a> {
    pub fn new(registry: &'a SemanticRegistry, policy: &'a dyn TablePolicy) -> Self {
        Self { registry, policy }
    }

    /// Validate a plan. `sql` is carried for tracing only.
    pub fn validate(&self, plan: &FinalizedPlan, sql: &str) -> SemanticValidation {
        let mut issues = Vec::new();

        if let Err(e) = self.policy.verify_allowed_tables(self.registry) {
            issues.push(e.to_string());
        }

        for entity in plan.selected_entities.iter().unique() {
            if !self.registry.contains_entity(entity) {
                issues.push(format!("Entity '{}' not loaded", entity));
            }
        }

        for edge in &plan.join_graph {
            for side in [&edge.from, &edge.to] {
                if !self.registry.contains_entity(side) {
                    issues.push(format!(
                        "Join {} -> {} references entity '{}' which is not loaded",
                        edge.from, edge.to, side
                    ));
                }
            }
        }

        self.check_fields(&plan.intent.dimensions, FieldClass::Dimension, &mut issues);
        self.check_fields(&plan.intent.metrics, FieldClass::Metric, &mut issues);

        if plan.intent.time_range.is_some() && !self.registry.has_time_dimensions() {
            issues.push("Time range provided but no time dimensions available".to_string());
        }

        if issues.is_empty() {
            debug!(sql_len = sql.len(), "Plan passed semantic validation");
        } else {
            warn!(sql = %sql, issues = ?issues, "Plan failed semantic validation");
        }

        SemanticValidation::from_issues(issues)
    }

    fn check_fields(&self, fields: &[FieldRef], class: FieldClass, issues: &mut Vec<String>) {
        for field_ref in fields {
            match field_ref.parse() {
                FieldPath::Qualified { entity, field } => match self.registry.entity(entity) {
                    Some(e) if class.resolves(e, field) => {}
                    Some(_) => issues.push(format!(
                        "{} '{}' not found on entity '{}'",
                        class.label(),
                        field_ref,
                        entity
                    )),
                    None => issues.push(format!(
                        "{} '{}' references entity '{}' which is not loaded",
                        class.label(),
                        field_ref,
                        entity
                    )),
                },
                FieldPath::Bare(field) => {
                    if !self.registry.entities().any(|e| class.resolves(e, field)) {
                        issues.push(format!(
                            "{} '{}' not found in any loaded entity",
                            class.label(),
                            field_ref
                        ));
                    }
                }
            }
        }
    }
}

/// Validate a plan against the registry and table policy
pub fn validate_semantics(
    plan: &FinalizedPlan,
    sql: &str,
    registry: &SemanticRegistry,
    policy: &dyn TablePolicy,
) -> SemanticValidation {
    SemanticValidator::new(registry, policy).validate(plan, sql)
}
