//! Entity canonicalization rules (§4H).

use serde_json::Value;

/// Flattens a `tags` object into an alternating `[k1, v1, k2, v2, ...]`
/// list (§4H, §8 Testable Property 4).
///
/// Non-object input (already a list, `null`, or a scalar) passes through
/// unchanged, since the original record may already have been normalized
/// by an earlier pass, or simply have no tags.
#[must_use]
pub fn flatten_tags(tags: &Value) -> Value {
    match tags {
        Value::Object(map) => {
            let mut flat = Vec::with_capacity(map.len() * 2);
            for (key, value) in map {
                flat.push(Value::String(key.clone()));
                flat.push(value.clone());
            }
            Value::Array(flat)
        }
        other => other.clone(),
    }
}

/// Lowercases an id for use as a graph key (§3: "IDs are lowercased").
#[must_use]
pub fn normalize_id(id: &str) -> String {
    id.to_lowercase()
}

/// Normalizes `displayName`/`display_name` to `name` on a JSON object,
/// in place (§4H).
///
/// Leaves an existing `name` field untouched if already present; only one
/// of `displayName`/`display_name` is expected on any given record, but
/// both are checked since Azure's casing is inconsistent across APIs.
pub fn normalize_display_name(record: &mut serde_json::Map<String, Value>) {
    if record.contains_key("name") {
        return;
    }
    if let Some(value) = record.remove("displayName").or_else(|| record.remove("display_name")) {
        record.insert("name".to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_object_tags_into_alternating_list() {
        let tags = json!({"a": 1, "b": 2});
        let flat = flatten_tags(&tags);
        let Value::Array(items) = flat else {
            panic!("expected array");
        };
        let as_multiset: std::collections::HashSet<String> =
            items.iter().map(|v| v.to_string()).collect();
        let expected: std::collections::HashSet<String> =
            ["\"a\"", "1", "\"b\"", "2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(as_multiset, expected);
    }

    #[test]
    fn passes_through_non_object_tags() {
        let tags = Value::Null;
        assert_eq!(flatten_tags(&tags), Value::Null);
    }

    #[test]
    fn normalize_id_lowercases() {
        assert_eq!(normalize_id("ABC-123"), "abc-123");
    }

    #[test]
    fn normalizes_display_name_variants() {
        let mut record = serde_json::Map::new();
        record.insert("displayName".to_string(), json!("Alice"));
        normalize_display_name(&mut record);
        assert_eq!(record.get("name"), Some(&json!("Alice")));
        assert!(!record.contains_key("displayName"));

        let mut record = serde_json::Map::new();
        record.insert("display_name".to_string(), json!("Bob"));
        normalize_display_name(&mut record);
        assert_eq!(record.get("name"), Some(&json!("Bob")));
    }

    #[test]
    fn existing_name_field_wins() {
        let mut record = serde_json::Map::new();
        record.insert("name".to_string(), json!("Existing"));
        record.insert("displayName".to_string(), json!("Ignored"));
        normalize_display_name(&mut record);
        assert_eq!(record.get("name"), Some(&json!("Existing")));
        assert_eq!(record.get("displayName"), Some(&json!("Ignored")));
    }
}
