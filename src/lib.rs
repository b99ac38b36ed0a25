//! Preflight checks for generated SQL.
//!
//! Normalizes quoting, rejects unsafe statements, cross-checks query plans
//! against the semantic registry, and classifies database errors for the
//! repair loop.

pub mod config;
pub mod error;
pub mod execution_loop;
pub mod guard;
pub mod intent;
pub mod security;
pub mod semantic;
pub mod validation;

pub use config::GuardConfig;
pub use error::{GuardError, Result};
pub use execution_loop::{classify_error, ClassifiedError, ErrorClassifier, ErrorRecovery};
pub use guard::{PreflightReport, SqlGuard};
pub use intent::{FieldRef, FinalizedPlan, JoinEdge, PlanIntent, TimeRange};
pub use security::{AllowAllTables, TableAllowList, TablePolicy};
pub use semantic::{load_from_file, load_from_json, Entity, FieldDefinition, SemanticRegistry};
pub use validation::{
    normalize_quotes, scan_statement_safety, validate_semantics, SemanticValidation,
    ValidationResult,
};
