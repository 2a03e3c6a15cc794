//! Error types for relay-whatsapp

use serde_json::Value;
use thiserror::Error;

/// relay-whatsapp error type
#[derive(Error, Debug)]
pub enum WhatsAppError {
    /// Non-2xx answer from the Graph API; the body is kept as sent
    #[error("WhatsApp API error: {status} - {body}")]
    Api { status: u16, body: Value },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WhatsAppError {
    /// Payload reported back to callers: the provider body when there is
    /// one, otherwise the error message
    pub fn error_payload(&self) -> Value {
        match self {
            WhatsAppError::Api { body, .. } => body.clone(),
            other => Value::String(other.to_string()),
        }
    }

    /// Upstream HTTP status, if the provider answered
    pub fn status(&self) -> Option<u16> {
        match self {
            WhatsAppError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(err: reqwest::Error) -> Self {
        WhatsAppError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, WhatsAppError>;
