//! Table Policy
//!
//! Allow-listing of physical tables. The validator only surfaces the verdict;
//! the rules live behind the `TablePolicy` trait.

use crate::error::{GuardError, Result};
use crate::semantic::registry::SemanticRegistry;
use std::collections::HashSet;

/// Policy collaborator consulted before semantic validation
pub trait TablePolicy: Send + Sync {
    fn verify_allowed_tables(&self, registry: &SemanticRegistry) -> Result<()>;
}

/// Allows every table
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllTables;

impl TablePolicy for AllowAllTables {
    fn verify_allowed_tables(&self, _registry: &SemanticRegistry) -> Result<()> {
        Ok(())
    }
}

/// Case-insensitive allow-list of physical table names
#[derive(Debug, Clone, Default)]
pub struct TableAllowList {
    allowed: HashSet<String>,
}

impl TableAllowList {
    pub fn new<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: tables
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn allows(&self, table: &str) -> bool {
        self.allowed.contains(&table.to_lowercase())
    }
}

impl TablePolicy for TableAllowList {
    fn verify_allowed_tables(&self, registry: &SemanticRegistry) -> Result<()> {
        let denied: Vec<&str> = registry
            .tables()
            .iter()
            .map(String::as_str)
            .filter(|t| !self.allows(t))
            .collect();

        if denied.is_empty() {
            Ok(())
        } else {
            Err(GuardError::Policy(format!(
                "Tables not in allow-list: {}",
                denied.join(", ")
            )))
        }
    }
}
