//! Pre-execution SQL validation
//!
//! Every validator here returns an aggregate result instead of failing fast,
//! so one pass reports everything wrong with a candidate query.

pub mod quote_normalizer;
pub mod semantic_validator;
pub mod statement_safety;

pub use quote_normalizer::*;
pub use semantic_validator::*;
pub use statement_safety::*;

use serde::{Deserialize, Serialize};

/// Outcome of a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub issues: Vec<String>,
}

impl ValidationResult {
    /// `ok` is true iff `issues` is empty
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self {
            ok: issues.is_empty(),
            issues,
        }
    }
}
