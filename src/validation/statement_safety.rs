//! Statement Safety Scanner
//!
//! Rejects anything other than a single read-only statement: stacked
//! statements, DDL/DML keywords and unbalanced block comments.

use crate::validation::ValidationResult;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

/// Keywords that must not appear anywhere in generated SQL.
/// GET and PUT guard against stage/file commands leaking into the query.
pub const DISALLOWED_KEYWORDS: &[&str] = &[
    "DROP", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE", "DELETE", "MERGE", "COPY", "PUT",
    "GET",
];

const COMMENT_OPEN: &str = "/*";
const COMMENT_CLOSE: &str = "*/";

lazy_static! {
    static ref DISALLOWED_PATTERNS: Vec<(&'static str, Regex)> = DISALLOWED_KEYWORDS
        .iter()
        .map(|kw| (*kw, Regex::new(&format!(r"(?i)\b{}\b", kw)).unwrap()))
        .collect();
}

/// Scan SQL text for unsafe statement shapes. All rules are checked.
pub fn scan_statement_safety(sql: &str) -> ValidationResult {
    let mut issues = Vec::new();
    let trimmed = sql.trim();

    let semicolons = trimmed.matches(';').count();
    if semicolons > 1 || (semicolons == 1 && !trimmed.ends_with(';')) {
        issues.push(format!(
            "Multiple statements are not allowed ({} ';' found, only one trailing terminator permitted)",
            semicolons
        ));
    }

    for (keyword, pattern) in DISALLOWED_PATTERNS.iter() {
        if pattern.is_match(trimmed) {
            issues.push(format!("Disallowed token: {}", keyword));
        }
    }

    let opened = trimmed.matches(COMMENT_OPEN).count();
    let closed = trimmed.matches(COMMENT_CLOSE).count();
    if opened != closed {
        issues.push(format!(
            "Unbalanced block comments: {} '{}' vs {} '{}'",
            opened, COMMENT_OPEN, closed, COMMENT_CLOSE
        ));
    }

    if !issues.is_empty() {
        warn!(issues = ?issues, "SQL rejected by statement safety scan");
    }

    ValidationResult::from_issues(issues)
}
