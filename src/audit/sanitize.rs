//! Detail sanitization for the run journal.
//!
//! Removes or redacts sensitive information from step details before they
//! are written to the journal.

use serde_json::{Map, Value};

const REDACTED: &str = "[REDACTED]";

/// Keys that should be redacted from the journal.
const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "secret",
    "key",
    "token",
    "credential",
    "connection_string",
    "auth",
];

/// Sanitize step details for the journal.
///
/// Redacts values for sensitive keys and recurses into nested objects and
/// arrays.
pub fn sanitize_params(params: &Value) -> Value {
    match params {
        Value::Object(map) => {
            let mut sanitized = Map::new();
            for (key, val) in map {
                let key_lower = key.to_lowercase();
                let is_sensitive = SENSITIVE_KEYS.iter().any(|&s| key_lower.contains(s));

                if is_sensitive {
                    sanitized.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    sanitized.insert(key.clone(), sanitize_params(val));
                }
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_params).collect()),
        _ => params.clone(),
    }
}

/// Replace every occurrence of each secret in `text`.
///
/// Error messages can echo command lines or file content, so known
/// credential values are scrubbed regardless of which key carried them.
pub fn redact_secrets(text: &str, secrets: &[&str]) -> String {
    secrets
        .iter()
        .filter(|s| !s.is_empty())
        .fold(text.to_string(), |acc, secret| acc.replace(secret, REDACTED))
}
