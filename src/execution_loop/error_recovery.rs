//! Error Recovery
//!
//! Builds repair guidance from error classifications for the retry loop.

use crate::execution_loop::error_classifier::{ClassifiedError, UNKNOWN_COLUMN};
use crate::semantic::registry::SemanticRegistry;
use std::sync::Arc;
use strsim::jaro_winkler;

const MAX_SUGGESTIONS: usize = 3;

/// Error recovery prompt builder
pub struct ErrorRecovery {
    semantic_registry: Arc<SemanticRegistry>,
    similarity_threshold: f64,
}

impl ErrorRecovery {
    pub fn new(semantic_registry: Arc<SemanticRegistry>) -> Self {
        Self {
            semantic_registry,
            similarity_threshold: 0.85,
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    /// Registry fields whose name resembles `name`, best match first
    pub fn suggest_fields(&self, name: &str) -> Vec<String> {
        let target = name.to_lowercase();
        let mut scored: Vec<(f64, &str)> = self
            .semantic_registry
            .field_names()
            .into_iter()
            .map(|candidate| (jaro_winkler(&target, &candidate.to_lowercase()), candidate))
            .filter(|(score, _)| *score >= self.similarity_threshold)
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(MAX_SUGGESTIONS)
            .map(|(_, candidate)| candidate.to_string())
            .collect()
    }

    /// Build a recovery prompt from an error classification
    pub fn build_recovery_prompt(&self, error_class: &ClassifiedError, attempt: u8) -> String {
        let mut prompt_parts = Vec::new();

        prompt_parts.push(format!(
            "RETRY ATTEMPT {}: the previous SQL failed with {}.",
            attempt,
            error_class.kind()
        ));

        match error_class {
            ClassifiedError::ColumnNotFound { missing_columns } => {
                prompt_parts.push(format!(
                    "These columns do not exist: {}",
                    missing_columns.join(", ")
                ));
                for column in missing_columns {
                    let suggestions = self.suggest_fields(column);
                    if !suggestions.is_empty() {
                        prompt_parts.push(format!(
                            "Instead of '{}', did you mean: {}?",
                            column,
                            suggestions.join(", ")
                        ));
                    }
                }
                prompt_parts.push("Use only columns defined in the schema.".to_string());
            }
            ClassifiedError::AmbiguousColumn { columns } => {
                let named: Vec<&str> = columns
                    .iter()
                    .map(String::as_str)
                    .filter(|c| *c != UNKNOWN_COLUMN)
                    .collect();
                if named.is_empty() {
                    prompt_parts.push("A column reference is ambiguous (exists in multiple tables).".to_string());
                } else {
                    prompt_parts.push(format!(
                        "These column references are ambiguous: {}",
                        named.join(", ")
                    ));
                }
                prompt_parts.push("Qualify every column with its table name or alias.".to_string());
            }
            ClassifiedError::QuoteSyntax { .. } => {
                prompt_parts.push("A string value appears to be wrapped in double quotes.".to_string());
                prompt_parts.push(
                    "Use single quotes for string literals and double quotes only for identifiers."
                        .to_string(),
                );
            }
            ClassifiedError::Timeout { message } => {
                prompt_parts.push(format!("Error details: {}", message));
                prompt_parts.push(
                    "Narrow the query (tighter time range, fewer dimensions, a LIMIT) before retrying."
                        .to_string(),
                );
            }
            ClassifiedError::Unclassified => {
                prompt_parts.push("The error could not be classified; review the SQL manually.".to_string());
            }
        }

        prompt_parts.join("\n")
    }
}
