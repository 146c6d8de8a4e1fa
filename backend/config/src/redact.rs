//! Config redaction: safe-to-print snapshots with secrets masked.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &["botToken", "bot_token", "token", "secret", "password"];

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Replace every sensitive string with its first four characters plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_sensitive_key(key) && !s.is_empty() => {
            let hint: String = s.chars().take(4).collect();
            if s.chars().count() > 4 {
                Value::String(format!("{hint}***"))
            } else {
                Value::String("***".to_string())
            }
        }
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_bot_token() {
        let v = json!({"telegram": {"botToken": "123456789:AAHdqTcvCH1vGWJxfSeofSAs0K5PALDsaw"}});
        let token = redact(&v)["telegram"]["botToken"].as_str().unwrap().to_string();
        assert_eq!(token, "1234***");
    }

    #[test]
    fn leaves_hosting_settings() {
        let v = json!({"hosting": {"ninjabox": {"linkHost": "nbox.me", "selectors": ["a.share-link"]}}});
        assert_eq!(redact(&v), v);
    }
}
