//! Error types for relay-telephony

use serde_json::Value;
use thiserror::Error;

/// relay-telephony error type
#[derive(Error, Debug)]
pub enum TelephonyError {
    /// Non-2xx answer from the provider
    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: Value },

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TelephonyError {
    fn from(err: reqwest::Error) -> Self {
        TelephonyError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, TelephonyError>;

/// Parse a provider body as JSON, keeping non-JSON text as a string
pub(crate) fn parse_body(text: String) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}
