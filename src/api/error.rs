use serde_json::Value;

use crate::session::SessionStoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session expired or missing; log in again")]
    Unauthorized,
    #[error("Not allowed for this account")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("HTTP error: {0}")]
    Transport(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Session store error: {0}")]
    Session(#[from] SessionStoreError),
}

impl ApiError {
    /// Classify a non-2xx response by status code and body.
    pub fn from_status(code: u16, body: &str) -> Self {
        let detail = || error_detail(body).unwrap_or_else(|| format!("HTTP {code}"));
        match code {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400..=499 => Self::BadRequest(detail()),
            _ => Self::Server(detail()),
        }
    }
}

/// Human-readable message from an error body's `detail` field: a string, or a
/// list of validation entries whose `msg` values are joined.
pub fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body.trim()).ok()?;
    match value.get("detail")? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Array(entries) => {
            let messages: Vec<&str> = entries
                .iter()
                .filter_map(|entry| entry.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
