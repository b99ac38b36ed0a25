//! Quote Normalizer
//!
//! Generated SQL often wraps string values in double quotes. This pass walks
//! the text once and decides, for every double-quoted token, whether it is an
//! identifier (kept as is) or a string literal (rewritten with single quotes).
//! It only rewrites; it never rejects input.

use crate::semantic::registry::SemanticRegistry;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Keywords that stay double-quoted when they appear as a quoted token
pub const SQL_KEYWORDS: &[&str] = &[
    "select", "from", "where", "group", "by", "order", "having", "join", "left", "right",
    "inner", "outer", "on", "as", "and", "or", "not", "count", "sum", "avg", "min", "max",
    "distinct", "limit", "offset",
];

lazy_static! {
    static ref IDENTIFIER_PATTERN: Regex = Regex::new(r"(?i)^[a-z_][a-z0-9_]*$").unwrap();
}

/// How a double-quoted token should be emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotedToken {
    Identifier,
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Outside,
    SingleQuoted,
    DoubleQuoted,
}

/// Classify the contents of a double-quoted span
pub fn classify_double_quoted(token: &str, registry: &SemanticRegistry) -> QuotedToken {
    if registry.is_known_identifier(token) {
        return QuotedToken::Identifier;
    }

    let lower = token.to_lowercase();
    if SQL_KEYWORDS.contains(&lower.as_str()) || IDENTIFIER_PATTERN.is_match(token) {
        QuotedToken::Identifier
    } else {
        QuotedToken::Literal
    }
}

/// Rewrite ambiguous double-quoted tokens into identifiers or string literals
pub fn normalize_quotes(sql: &str, registry: &SemanticRegistry) -> String {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut state = ScanState::Outside;
    // byte offset of the opening quote of the current span
    let mut span_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match state {
            ScanState::Outside => match bytes[i] {
                b'\'' => {
                    state = ScanState::SingleQuoted;
                    span_start = i;
                    i += 1;
                }
                b'"' => {
                    state = ScanState::DoubleQuoted;
                    span_start = i;
                    i += 1;
                }
                _ => {
                    let next = sql[i..]
                        .find(|c: char| c == '\'' || c == '"')
                        .map_or(bytes.len(), |offset| i + offset);
                    out.push_str(&sql[i..next]);
                    i = next;
                }
            },
            ScanState::SingleQuoted => {
                if bytes[i] == b'\'' && bytes[i - 1] != b'\\' {
                    out.push_str(&sql[span_start..=i]);
                    state = ScanState::Outside;
                }
                i += 1;
            }
            ScanState::DoubleQuoted => {
                if bytes[i] == b'"' {
                    let token = &sql[span_start + 1..i];
                    emit_double_quoted(token, registry, &mut out);
                    state = ScanState::Outside;
                }
                i += 1;
            }
        }
    }

    // Unterminated quote: keep the remainder untouched
    if state != ScanState::Outside {
        out.push_str(&sql[span_start..]);
    }

    out
}

fn emit_double_quoted(token: &str, registry: &SemanticRegistry, out: &mut String) {
    match classify_double_quoted(token, registry) {
        QuotedToken::Identifier => {
            out.push('"');
            out.push_str(token);
            out.push('"');
        }
        QuotedToken::Literal => {
            debug!(token, "Rewriting double-quoted token as string literal");
            out.push('\'');
            out.push_str(&token.replace('\'', "''"));
            out.push('\'');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::entity::{Entity, FieldDefinition};

    fn registry() -> SemanticRegistry {
        SemanticRegistry::from_entities([Entity::new(
            "customers",
            "dim_customers",
            vec![FieldDefinition::new("Country Name").with_aliases(["region"])],
            vec![FieldDefinition::new("signup_date")],
            vec![FieldDefinition::new("lifetime_value")],
        )
        .unwrap()])
        .unwrap()
    }

    #[test]
    fn test_identifiers_keep_double_quotes() {
        let sql = r#"SELECT "country name", "lifetime_value" FROM "dim_customers""#;
        assert_eq!(normalize_quotes(sql, &registry()), sql);
    }

    #[test]
    fn test_known_name_with_spaces_is_identifier() {
        let sql = r#"SELECT "Country Name" FROM customers"#;
        assert_eq!(normalize_quotes(sql, &registry()), sql);
    }

    #[test]
    fn test_literal_rewritten_to_single_quotes() {
        let sql = r#"SELECT * FROM customers WHERE segment = "Small Business""#;
        assert_eq!(
            normalize_quotes(sql, &registry()),
            "SELECT * FROM customers WHERE segment = 'Small Business'"
        );
    }

    #[test]
    fn test_embedded_single_quote_doubled() {
        let sql = r#"WHERE name = "O'Brien & Sons""#;
        assert_eq!(
            normalize_quotes(sql, &registry()),
            "WHERE name = 'O''Brien & Sons'"
        );
    }

    #[test]
    fn test_keyword_token_is_identifier() {
        assert_eq!(
            classify_double_quoted("ORDER", &SemanticRegistry::new()),
            QuotedToken::Identifier
        );
        assert_eq!(
            classify_double_quoted("2024-01-01", &SemanticRegistry::new()),
            QuotedToken::Literal
        );
    }

    #[test]
    fn test_single_quoted_spans_copied_verbatim() {
        let sql = r#"WHERE a = 'say "hi"' AND b = 'it\'s' AND c = "x y""#;
        assert_eq!(
            normalize_quotes(sql, &registry()),
            r#"WHERE a = 'say "hi"' AND b = 'it\'s' AND c = 'x y'"#
        );
    }

    #[test]
    fn test_unterminated_quotes_consume_to_end() {
        let reg = registry();
        assert_eq!(normalize_quotes(r#"WHERE a = "open ended"#, &reg), r#"WHERE a = "open ended"#);
        assert_eq!(normalize_quotes("WHERE a = 'open ended", &reg), "WHERE a = 'open ended");
    }

    #[test]
    fn test_non_ascii_passes_through() {
        let sql = r#"SELECT "Zürich Büro" AS ville, 'café' FROM t -- ünïcode"#;
        assert_eq!(
            normalize_quotes(sql, &registry()),
            r#"SELECT 'Zürich Büro' AS ville, 'café' FROM t -- ünïcode"#
        );
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let reg = registry();
        let sql = r#"SELECT "region", COUNT(*) FROM "dim_customers" WHERE city = "New York" AND note = "it's""#;
        let once = normalize_quotes(sql, &reg);
        assert_eq!(normalize_quotes(&once, &reg), once);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize_quotes("", &registry()), "");
    }
}
