use serde_json::Value;

/// Envelope keys that may wrap a list, in lookup order.
pub const ENVELOPE_KEYS: [&str; 5] = ["items", "results", "logs", "data", "rows"];

/// Flatten a list response into its rows.
///
/// Accepts a bare array or an object carrying the array under one of
/// [`ENVELOPE_KEYS`]. Anything else yields an empty list.
pub fn normalize_envelope(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(rows) => rows,
        Value::Object(mut object) => ENVELOPE_KEYS
            .iter()
            .find(|key| object.get(**key).is_some_and(Value::is_array))
            .and_then(|key| object.remove(*key))
            .and_then(|value| match value {
                Value::Array(rows) => Some(rows),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}
