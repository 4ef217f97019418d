//! Log-safe partial redaction of secret values and credentials

use serde_json::{Map, Value as JsonValue};

/// Rendered for empty or missing values
pub const NOT_SET: &str = "<not set>";

/// Rendered for values too short to reveal any part of
pub const SHORT_MASK: &str = "***";

const SHORT_LIMIT: usize = 8;

/// Keys whose values are masked by [`mask_json_value`]
const SENSITIVE_KEYS: &[&str] = &[
    "value",
    "secretvalue",
    "clientsecret",
    "client_secret",
    "apikey",
    "api_key",
    "accesstoken",
    "access_token",
    "password",
];

/// Mask a secret value, keeping two characters at each end.
pub fn mask_secret(value: &str) -> String {
    mask_keeping(value, 2)
}

/// Mask a credential for start-up logs, keeping four characters at each end.
pub fn mask_credential(value: &str) -> String {
    mask_keeping(value, 4)
}

fn mask_keeping(value: &str, keep: usize) -> String {
    if value.is_empty() {
        return NOT_SET.to_string();
    }
    if value.len() <= SHORT_LIMIT {
        return SHORT_MASK.to_string();
    }
    let head = floor_boundary(value, keep);
    let tail = ceil_boundary(value, value.len() - keep);
    format!("{}...{}", &value[..head], &value[tail..])
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, mut idx: usize) -> usize {
    while !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Whether a JSON key carries a value that must be masked before logging
pub fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEYS.contains(&lower.as_str())
}

/// Copy of `value` with every string under a sensitive key masked.
pub fn mask_json_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let masked: Map<String, JsonValue> = map
                .iter()
                .map(|(key, val)| {
                    let val = match val {
                        JsonValue::String(s) if is_sensitive_key(key) => {
                            JsonValue::String(mask_secret(s))
                        }
                        other => mask_json_value(other),
                    };
                    (key.clone(), val)
                })
                .collect();
            JsonValue::Object(masked)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(mask_json_value).collect()),
        other => other.clone(),
    }
}
