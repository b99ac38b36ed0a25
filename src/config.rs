//! Guard Configuration
//!
//! Reads runtime settings from the environment. Call `dotenv::dotenv()` first
//! if a `.env` file should be honoured.

use crate::error::{GuardError, Result};
use std::path::PathBuf;

pub const REGISTRY_ENV: &str = "SQL_GUARD_REGISTRY";
pub const ALLOWED_TABLES_ENV: &str = "SQL_GUARD_ALLOWED_TABLES";
pub const LOG_ENV: &str = "SQL_GUARD_LOG";
pub const SUGGESTION_THRESHOLD_ENV: &str = "SQL_GUARD_SUGGESTION_THRESHOLD";

/// Runtime configuration for the guard
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    /// Registry JSON file produced by the schema loader
    pub registry_path: Option<PathBuf>,
    /// Physical tables the policy allows; `None` allows every table
    pub allowed_tables: Option<Vec<String>>,
    /// Default tracing filter when RUST_LOG is unset
    pub log_filter: String,
    /// Jaro-Winkler similarity needed before a field is suggested
    pub suggestion_threshold: f64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            registry_path: None,
            allowed_tables: None,
            log_filter: "info".to_string(),
            suggestion_threshold: 0.85,
        }
    }
}

impl GuardConfig {
    /// Build configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(REGISTRY_ENV).filter(|p| !p.trim().is_empty()) {
            config.registry_path = Some(PathBuf::from(path.trim()));
        }

        if let Some(tables) = lookup(ALLOWED_TABLES_ENV) {
            config.allowed_tables = Some(parse_table_list(&tables));
        }

        if let Some(filter) = lookup(LOG_ENV).filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter.trim().to_string();
        }

        if let Some(raw) = lookup(SUGGESTION_THRESHOLD_ENV) {
            let threshold: f64 = raw.trim().parse().map_err(|_| {
                GuardError::Config(format!(
                    "{} must be a number, got '{}'",
                    SUGGESTION_THRESHOLD_ENV, raw
                ))
            })?;
            if !(0.0..=1.0).contains(&threshold) {
                return Err(GuardError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    SUGGESTION_THRESHOLD_ENV, threshold
                )));
            }
            config.suggestion_threshold = threshold;
        }

        Ok(config)
    }
}

/// Split a comma-separated table list, dropping blanks
pub fn parse_table_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = GuardConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, GuardConfig::default());
    }

    #[test]
    fn test_reads_all_keys() {
        let config = GuardConfig::from_lookup(lookup_from(&[
            (REGISTRY_ENV, "registry.json"),
            (ALLOWED_TABLES_ENV, "dim_customers, fact_orders,,"),
            (LOG_ENV, "debug"),
            (SUGGESTION_THRESHOLD_ENV, "0.9"),
        ]))
        .unwrap();

        assert_eq!(config.registry_path, Some(PathBuf::from("registry.json")));
        assert_eq!(
            config.allowed_tables,
            Some(vec!["dim_customers".to_string(), "fact_orders".to_string()])
        );
        assert_eq!(config.log_filter, "debug");
        assert!((config.suggestion_threshold - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        let err = GuardConfig::from_lookup(lookup_from(&[(SUGGESTION_THRESHOLD_ENV, "1.5")]))
            .unwrap_err();
        assert!(err.to_string().contains("between 0.0 and 1.0"));

        let err = GuardConfig::from_lookup(lookup_from(&[(SUGGESTION_THRESHOLD_ENV, "high")]))
            .unwrap_err();
        assert!(err.to_string().contains("must be a number"));
    }
}
