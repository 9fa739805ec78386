//! Redaction of sensitive parameter fields before logging.

use serde_json::{Map, Value};

/// Replacement written over sensitive values.
pub const REDACTED: &str = "[REDACTED]";

/// Field names whose values are never logged, compared case-insensitively.
pub const SENSITIVE_FIELDS: [&str; 6] = ["password", "token", "secret", "key", "authorization", "apikey"];

/// Returns a copy of `value` with every sensitive field redacted, at any depth.
///
/// # Example
///
/// ```
/// use liaison_middleware::sanitize::sanitize;
/// use serde_json::json;
///
/// let clean = sanitize(&json!({ "email": "a@b.co", "auth": { "apiKey": "k-1" } }));
/// assert_eq!(clean, json!({ "email": "a@b.co", "auth": { "apiKey": "[REDACTED]" } }));
/// ```
#[must_use]
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(sanitize_map(map)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        other => other.clone(),
    }
}

/// Redacts a JSON object.
#[must_use]
pub fn sanitize_map(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| {
            let value = if is_sensitive(key) {
                Value::String(REDACTED.to_string())
            } else {
                sanitize(value)
            };
            (key.clone(), value)
        })
        .collect()
}

fn is_sensitive(key: &str) -> bool {
    SENSITIVE_FIELDS
        .iter()
        .any(|field| key.eq_ignore_ascii_case(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_top_level_fields_redacted() {
        let clean = sanitize(&json!({
            "email": "user@example.com",
            "password": "hunter22",
            "Authorization": "Bearer abc",
        }));

        assert_eq!(clean["email"], "user@example.com");
        assert_eq!(clean["password"], REDACTED);
        assert_eq!(clean["Authorization"], REDACTED);
    }

    #[test]
    fn test_nested_and_array_fields_redacted() {
        let clean = sanitize(&json!({
            "devices": [{ "TOKEN": "t-1", "name": "phone" }],
            "settings": { "secret": { "deep": true } },
        }));

        assert_eq!(clean["devices"][0]["TOKEN"], REDACTED);
        assert_eq!(clean["devices"][0]["name"], "phone");
        assert_eq!(clean["settings"]["secret"], REDACTED);
    }

    #[test]
    fn test_similar_names_are_kept() {
        let clean = sanitize(&json!({ "keyword": "rust", "tokens_used": 3 }));
        assert_eq!(clean["keyword"], "rust");
        assert_eq!(clean["tokens_used"], 3);
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(sanitize(&json!("password")), json!("password"));
        assert_eq!(sanitize(&Value::Null), Value::Null);
    }
}
