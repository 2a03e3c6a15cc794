//! Error types for relay-api

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;

use relay_telephony::TelephonyError;
use relay_whatsapp::WhatsAppError;

/// relay-api error type
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String),

    /// Provider answered with an error; status and body are relayed
    #[error("Upstream error: {status}")]
    Upstream { status: u16, body: Value },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Upstream { status, body } => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                (status, Json(body)).into_response()
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}

impl From<TelephonyError> for ApiError {
    fn from(err: TelephonyError) -> Self {
        match err {
            TelephonyError::Upstream { status, body } => ApiError::Upstream { status, body },
            TelephonyError::Http(message) => ApiError::Internal(message),
        }
    }
}

impl From<WhatsAppError> for ApiError {
    fn from(err: WhatsAppError) -> Self {
        match err {
            WhatsAppError::Api { status, body } => ApiError::Upstream { status, body },
            WhatsAppError::InvalidPayload(message) => ApiError::Validation(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
