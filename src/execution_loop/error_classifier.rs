//! Error Classifier
//!
//! Classifies raw database error text into categories the repair loop can act
//! on. Each rule is a pure function returning `None` when it does not apply;
//! `ErrorClassifier` tries them in order and falls back to `Unclassified`.
//! Every public entry point accepts a raw error value (`str`, `String` or a
//! `serde_json::Value`) through `ErrorText`.

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

/// Placeholder column when an ambiguity error names no column
pub const UNKNOWN_COLUMN: &str = "<unknown column>";

lazy_static! {
    static ref INVALID_IDENTIFIER: Regex =
        Regex::new(r"(?i)invalid identifiers?\s+'([^']+)'").unwrap();
    static ref COLUMN_NOT_FOUND: Regex =
        Regex::new(r#"(?i)\bcolumn\s+("[^"]+"|'[^']+'|`[^`]+`|\S+)\s+not\s+found"#).unwrap();
    static ref DOUBLE_QUOTED: Regex = Regex::new(r#""([^"]+)""#).unwrap();
    static ref NO_SUCH_COLUMN: Regex =
        Regex::new(r#"(?i)no such column:?\s*["'`]?([^"'`\s,;)]+)"#).unwrap();
    static ref ALL_CAPS_IDENTIFIER: Regex = Regex::new(r"^[A-Z0-9_]+$").unwrap();
}

/// SQL error classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifiedError {
    ColumnNotFound {
        missing_columns: Vec<String>,
    },
    AmbiguousColumn {
        columns: Vec<String>,
    },
    Timeout {
        message: String,
    },
    QuoteSyntax {
        message: String,
        needs_single_quotes: bool,
        needs_double_quotes: bool,
    },
    Unclassified,
}

impl ClassifiedError {
    /// Column, ambiguity and quoting errors can usually be fixed by
    /// regenerating SQL; timeouts and unknown errors cannot.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClassifiedError::ColumnNotFound { .. }
                | ClassifiedError::AmbiguousColumn { .. }
                | ClassifiedError::QuoteSyntax { .. }
        )
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassifiedError::ColumnNotFound { .. } => "ColumnNotFound",
            ClassifiedError::AmbiguousColumn { .. } => "AmbiguousColumn",
            ClassifiedError::Timeout { .. } => "Timeout",
            ClassifiedError::QuoteSyntax { .. } => "QuoteSyntax",
            ClassifiedError::Unclassified => "Unclassified",
        }
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifiedError::ColumnNotFound { missing_columns } => {
                write!(f, "ColumnNotFound({})", missing_columns.join(", "))
            }
            ClassifiedError::AmbiguousColumn { columns } => {
                write!(f, "AmbiguousColumn({})", columns.join(", "))
            }
            ClassifiedError::Timeout { message } => write!(f, "Timeout({})", message),
            ClassifiedError::QuoteSyntax { message, .. } => write!(f, "QuoteSyntax({})", message),
            ClassifiedError::Unclassified => write!(f, "Unclassified"),
        }
    }
}

/// A raw error a classifier can read text from
pub trait ErrorText {
    fn error_text(&self) -> Cow<'_, str>;
}

impl ErrorText for str {
    fn error_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl ErrorText for String {
    fn error_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

impl ErrorText for serde_json::Value {
    fn error_text(&self) -> Cow<'_, str> {
        Cow::Owned(error_message(self))
    }
}

/// A classification rule over extracted error text
pub type ClassifierRule = fn(&str) -> Option<ClassifiedError>;

/// Rules in the order they are tried
pub const CLASSIFIER_RULES: &[(&str, ClassifierRule)] = &[
    ("column_not_found", column_not_found),
    ("ambiguous_column", ambiguous_column),
    ("timeout", timeout),
    ("quote_syntax", quote_syntax),
];

/// Missing column(s): `invalid identifier 'X'`, else `column X not found`
pub fn classify_column_not_found<E: ErrorText + ?Sized>(error: &E) -> Option<ClassifiedError> {
    column_not_found(&error.error_text())
}

/// Ambiguous column reference; columns are taken from double-quoted names
pub fn classify_ambiguous_column<E: ErrorText + ?Sized>(error: &E) -> Option<ClassifiedError> {
    ambiguous_column(&error.error_text())
}

/// Generic or `Statement timeout` errors; the message is kept verbatim
pub fn classify_timeout<E: ErrorText + ?Sized>(error: &E) -> Option<ClassifiedError> {
    timeout(&error.error_text())
}

/// Errors suggesting a string value was double-quoted instead of single-quoted.
///
/// The `no such column` branch assumes a capitalised, non-all-caps name is a
/// value rather than a column, so PascalCase column names are misread. `near`
/// is a plain substring test, so words such as `nonlinear` also trigger it.
pub fn classify_quote_syntax<E: ErrorText + ?Sized>(error: &E) -> Option<ClassifiedError> {
    quote_syntax(&error.error_text())
}

fn column_not_found(message: &str) -> Option<ClassifiedError> {
    let mut missing_columns: Vec<String> = INVALID_IDENTIFIER
        .captures_iter(message)
        .map(|caps| caps[1].to_string())
        .unique()
        .collect();

    if missing_columns.is_empty() {
        if let Some(caps) = COLUMN_NOT_FOUND.captures(message) {
            let name = caps[1].trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
            if !name.is_empty() {
                missing_columns.push(name.to_string());
            }
        }
    }

    if missing_columns.is_empty() {
        None
    } else {
        Some(ClassifiedError::ColumnNotFound { missing_columns })
    }
}

fn ambiguous_column(message: &str) -> Option<ClassifiedError> {
    let lower = message.to_lowercase();
    if !(lower.contains("ambiguous") && lower.contains("column")) {
        return None;
    }

    let mut columns: Vec<String> = DOUBLE_QUOTED
        .captures_iter(message)
        .map(|caps| caps[1].to_string())
        .unique()
        .collect();
    if columns.is_empty() {
        columns.push(UNKNOWN_COLUMN.to_string());
    }

    Some(ClassifiedError::AmbiguousColumn { columns })
}

fn timeout(message: &str) -> Option<ClassifiedError> {
    if message.to_lowercase().contains("timeout") {
        Some(ClassifiedError::Timeout {
            message: message.to_string(),
        })
    } else {
        None
    }
}

fn quote_syntax(message: &str) -> Option<ClassifiedError> {
    let lower = message.to_lowercase();
    let has_double_quote = message.contains('"');

    let unrecognized_token = lower.contains("unrecognized token") && has_double_quote;

    let value_like_column = NO_SUCH_COLUMN.captures(message).map_or(false, |caps| {
        let name = &caps[1];
        name.chars().next().map_or(false, |c| c.is_uppercase())
            && !ALL_CAPS_IDENTIFIER.is_match(name)
    });

    let syntax_near_quote =
        (lower.contains("syntax error") || lower.contains("near")) && has_double_quote;

    if unrecognized_token || value_like_column || syntax_near_quote {
        Some(ClassifiedError::QuoteSyntax {
            message: message.to_string(),
            needs_single_quotes: true,
            needs_double_quotes: false,
        })
    } else {
        None
    }
}

/// Extract error text from a raw error value: an object's `message` field,
/// a plain string, or the value stringified. `null` and a `null` message give
/// empty text; an object without `message` is stringified whole.
pub fn error_message(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(map) => match map.get("message") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Null) => String::new(),
            Some(other) => other.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Error classifier
pub struct ErrorClassifier {
    rules: Vec<(&'static str, ClassifierRule)>,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self {
            rules: CLASSIFIER_RULES.to_vec(),
        }
    }

    /// Append a rule tried after the built-in ones
    pub fn with_rule(mut self, name: &'static str, rule: ClassifierRule) -> Self {
        self.rules.push((name, rule));
        self
    }

    /// Classify a raw error; the first matching rule wins
    pub fn classify<E: ErrorText + ?Sized>(&self, error: &E) -> ClassifiedError {
        let message = error.error_text();
        for (name, rule) in &self.rules {
            if let Some(classified) = rule(&message) {
                debug!(rule = name, kind = classified.kind(), "Classified database error");
                return classified;
            }
        }
        ClassifiedError::Unclassified
    }
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify a raw error with the built-in rules
pub fn classify_error<E: ErrorText + ?Sized>(error: &E) -> ClassifiedError {
    ErrorClassifier::new().classify(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_invalid_identifier() {
        assert_eq!(
            classify_error("invalid identifier 'FOO'"),
            ClassifiedError::ColumnNotFound {
                missing_columns: vec!["FOO".to_string()]
            }
        );
    }

    #[test]
    fn test_invalid_identifiers_deduplicated_in_order() {
        let msg = "SQL compilation error: invalid identifier 'B'; Invalid Identifiers 'A', invalid identifier 'B'";
        assert_eq!(
            classify_column_not_found(msg),
            Some(ClassifiedError::ColumnNotFound {
                missing_columns: vec!["B".to_string(), "A".to_string()]
            })
        );
    }

    #[test]
    fn test_column_not_found_fallback_strips_quotes() {
        assert_eq!(
            classify_column_not_found("Binder Error: column \"order_total\" not found"),
            Some(ClassifiedError::ColumnNotFound {
                missing_columns: vec!["order_total".to_string()]
            })
        );
    }

    #[test]
    fn test_column_not_found_fallback_keeps_spaced_quoted_names() {
        assert_eq!(
            classify_column_not_found(
                "Binder Error: Referenced column \"order total\" not found in FROM clause"
            ),
            Some(ClassifiedError::ColumnNotFound {
                missing_columns: vec!["order total".to_string()]
            })
        );
        assert_eq!(
            classify_error("column `Order Total` not found"),
            ClassifiedError::ColumnNotFound {
                missing_columns: vec!["Order Total".to_string()]
            }
        );
        assert_eq!(
            classify_column_not_found("column 'net amount' not found"),
            Some(ClassifiedError::ColumnNotFound {
                missing_columns: vec!["net amount".to_string()]
            })
        );
    }

    #[test]
    fn test_classify_ambiguous_column() {
        assert_eq!(
            classify_error("ambiguous column name \"id\""),
            ClassifiedError::AmbiguousColumn {
                columns: vec!["id".to_string()]
            }
        );
        assert_eq!(
            classify_ambiguous_column("Column reference is AMBIGUOUS"),
            Some(ClassifiedError::AmbiguousColumn {
                columns: vec![UNKNOWN_COLUMN.to_string()]
            })
        );
    }

    #[test]
    fn test_classify_timeout_keeps_message() {
        let msg = "Statement timeout: query exceeded 30s";
        assert_eq!(
            classify_error(msg),
            ClassifiedError::Timeout {
                message: msg.to_string()
            }
        );
        assert!(classify_timeout("connection TIMEOUT while reading").is_some());
    }

    #[test]
    fn test_classify_quote_syntax_variants() {
        assert!(classify_quote_syntax("unrecognized token: \"'abc\"").is_some());
        assert!(classify_quote_syntax("near \"Pending\": syntax error").is_some());
        assert!(classify_quote_syntax("no such column: Pending").is_some());
        assert!(classify_quote_syntax("no such column: STATUS_CODE").is_none());
        assert!(classify_quote_syntax("no such column: status").is_none());
        assert!(classify_quote_syntax("syntax error at end of input").is_none());
    }

    #[test]
    fn test_pascal_case_column_is_misread_as_literal() {
        // Known limitation: a real PascalCase column is treated as a value.
        let classified = classify_quote_syntax("no such column: CustomerName");
        assert!(matches!(
            classified,
            Some(ClassifiedError::QuoteSyntax {
                needs_single_quotes: true,
                needs_double_quotes: false,
                ..
            })
        ));
    }

    #[test]
    fn test_near_substring_matches_inside_words() {
        // Known limitation: `near` is matched anywhere, e.g. inside `nonlinear`.
        let classified = classify_quote_syntax("value \"x\" is nonlinear");
        assert!(matches!(classified, Some(ClassifiedError::QuoteSyntax { .. })));
    }

    #[test]
    fn test_empty_and_malformed_inputs_do_not_match() {
        for input in ["", "   ", "\"", "'", "invalid identifier ''", "column  not found"] {
            for (name, rule) in CLASSIFIER_RULES {
                assert!(rule(input).is_none(), "rule {} matched {:?}", name, input);
            }
        }

        let values = [
            serde_json::Value::Null,
            json!([]),
            json!(42),
            json!({}),
            json!({"message": null}),
            json!({"message": 7}),
        ];
        for value in &values {
            assert!(classify_column_not_found(value).is_none(), "matched {}", value);
            assert!(classify_ambiguous_column(value).is_none(), "matched {}", value);
            assert!(classify_timeout(value).is_none(), "matched {}", value);
            assert!(classify_quote_syntax(value).is_none(), "matched {}", value);
            assert_eq!(classify_error(value), ClassifiedError::Unclassified);
        }
    }

    #[test]
    fn test_rules_accept_raw_error_values() {
        assert_eq!(
            classify_column_not_found(&json!({"message": "invalid identifier 'X'"})),
            Some(ClassifiedError::ColumnNotFound {
                missing_columns: vec!["X".to_string()]
            })
        );
        assert!(classify_timeout(&json!("Statement timeout")).is_some());
        assert!(classify_ambiguous_column(&json!({"message": "ambiguous column \"id\""})).is_some());
        assert!(classify_quote_syntax(&json!({"message": "no such column: Pending"})).is_some());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(&json!({"message": "boom"})), "boom");
        assert_eq!(error_message(&json!({"message": null})), "");
        assert_eq!(error_message(&json!({"code": 42})), r#"{"code":42}"#);
        assert_eq!(error_message(&json!("plain")), "plain");
        assert_eq!(error_message(&json!(604)), "604");
        assert_eq!(
            ErrorClassifier::new().classify(&json!({"error": "invalid identifier 'X'"})),
            ClassifiedError::ColumnNotFound {
                missing_columns: vec!["X".to_string()]
            }
        );
        assert_eq!(
            ErrorClassifier::new().classify(&json!({"message": "invalid identifier 'X'"})),
            ClassifiedError::ColumnNotFound {
                missing_columns: vec!["X".to_string()]
            }
        );
    }

    #[test]
    fn test_retryability() {
        assert!(classify_error("invalid identifier 'A'").is_retryable());
        assert!(!classify_error("Statement timeout").is_retryable());
        assert!(!classify_error("permission denied").is_retryable());
    }

    #[test]
    fn test_custom_rule_runs_after_builtins() {
        fn permission(msg: &str) -> Option<ClassifiedError> {
            msg.contains("permission").then(|| ClassifiedError::Timeout {
                message: "custom".to_string(),
            })
        }
        let classifier = ErrorClassifier::new().with_rule("permission", permission);
        assert_eq!(
            classifier.classify("permission denied"),
            ClassifiedError::Timeout {
                message: "custom".to_string()
            }
        );
    }
}
