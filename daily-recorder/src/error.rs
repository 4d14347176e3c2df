//! Error types shared by the receiver and the CLI tools.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Startup configuration failure. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Failure talking to the provider REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to sign meeting token: {0}")]
    Token(String),

    #[error("recording {0} has no download link")]
    NoDownloadLink(String),
}

/// Request-path failures of the webhook receiver.
///
/// Enrichment failures never surface here; they are recovered inside the
/// enrichment step and recorded as unavailable fields.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid signature")]
    AuthenticationFailure,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("internal fault: {0}")]
    InternalFault(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebhookError::AuthenticationFailure => {
                (StatusCode::UNAUTHORIZED, "Invalid signature".to_string())
            }
            WebhookError::MalformedPayload(reason) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Malformed payload: {reason}"),
            ),
            WebhookError::InternalFault(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Failure reading or writing the CLI session file.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
