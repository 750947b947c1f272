//! Cypher string-literal sanitization (§4I).

use serde_json::Value;

/// Doubles backslashes and strips single quotes from a string value, per
/// §4I: "String values are sanitized: backslash doubled, single-quotes
/// stripped."
#[must_use]
pub fn sanitize_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "")
}

/// Renders a JSON scalar as a Cypher literal for a `SET` clause.
///
/// Strings are quoted and sanitized; `null` and empty strings become the
/// literal `''` (§4I); numbers and booleans render as their own Cypher
/// literal syntax; arrays/objects are serialized to a JSON string and
/// quoted, since Cypher has no native map-valued property syntax that
/// round-trips arbitrary nesting.
#[must_use]
pub fn cypher_literal(value: &Value) -> String {
    match value {
        Value::Null => "''".to_string(),
        Value::String(s) if s.is_empty() => "''".to_string(),
        Value::String(s) => format!("'{}'", sanitize_string(s)),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("'{}'", sanitize_string(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn doubles_backslashes() {
        assert_eq!(sanitize_string(r"a\b"), r"a\\b");
    }

    #[test]
    fn strips_single_quotes() {
        assert_eq!(sanitize_string("o'brien"), "obrien");
    }

    #[test]
    fn null_becomes_empty_literal() {
        assert_eq!(cypher_literal(&Value::Null), "''");
    }

    #[test]
    fn empty_string_becomes_empty_literal() {
        assert_eq!(cypher_literal(&json!("")), "''");
    }

    #[test]
    fn numbers_and_bools_render_unquoted() {
        assert_eq!(cypher_literal(&json!(42)), "42");
        assert_eq!(cypher_literal(&json!(true)), "true");
    }

    #[test]
    fn strings_are_quoted_and_sanitized() {
        assert_eq!(cypher_literal(&json!("o'brien")), "'obrien'");
    }
}
