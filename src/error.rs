use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the relay
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion API error (HTTP {status})")]
    Upstream { status: u16, body: String },

    #[error("Completion API request failed: {0}")]
    Transport(String),

    #[error("Completion API timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed completion response: {0}")]
    MalformedCompletion(String),

    #[error("Completion response contained no text")]
    EmptyCompletion,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;

impl RelayError {
    /// True for every failure that originated at the completion API boundary
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RelayError::Upstream { .. }
                | RelayError::Transport(_)
                | RelayError::Timeout(_)
                | RelayError::MalformedCompletion(_)
                | RelayError::EmptyCompletion
        )
    }

    /// Get the error code for structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            RelayError::Validation(_) => "VALIDATION_ERROR",
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::Upstream { .. } => "UPSTREAM_ERROR",
            RelayError::Transport(_) => "UPSTREAM_TRANSPORT_ERROR",
            RelayError::Timeout(_) => "UPSTREAM_TIMEOUT",
            RelayError::MalformedCompletion(_) => "UPSTREAM_MALFORMED",
            RelayError::EmptyCompletion => "UPSTREAM_EMPTY",
            RelayError::Serialization(_) => "SERIALIZATION_ERROR",
            RelayError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// HTTP status reported to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Validation(_) => StatusCode::BAD_REQUEST,
            RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            err if err.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Diagnostic detail echoed back in the `details` field.
    ///
    /// Upstream HTTP failures forward the raw body the completion API sent.
    pub fn details(&self) -> Option<String> {
        match self {
            RelayError::Validation(_) | RelayError::Config(_) => None,
            RelayError::Upstream { body, .. } => Some(body.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Convert to the `{ error, details? }` body sent to callers
    pub fn to_error_payload(&self) -> serde_json::Value {
        let error = match self {
            RelayError::Validation(message) => message.clone(),
            RelayError::Config(message) => message.clone(),
            err if err.is_upstream() => "OpenAI API error".to_string(),
            _ => "Server error".to_string(),
        };

        match self.details() {
            Some(details) => json!({ "error": error, "details": details }),
            None => json!({ "error": error }),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_error_payload())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_client_errors_without_details() {
        let err = RelayError::Validation("Missing required fields: budget".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let payload = err.to_error_payload();
        assert_eq!(payload["error"], "Missing required fields: budget");
        assert!(payload.get("details").is_none());
    }

    #[test]
    fn upstream_http_errors_echo_the_raw_body() {
        let err = RelayError::Upstream {
            status: 429,
            body: r#"{"error":{"message":"slow down"}}"#.to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);

        let payload = err.to_error_payload();
        assert_eq!(payload["error"], "OpenAI API error");
        assert_eq!(payload["details"], r#"{"error":{"message":"slow down"}}"#);
    }

    #[test]
    fn timeouts_and_empty_replies_are_upstream_failures() {
        assert_eq!(
            RelayError::Timeout(Duration::from_secs(30)).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            RelayError::EmptyCompletion.status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn unknown_errors_are_reported_generically() {
        let err = RelayError::Unknown("socket closed".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let payload = err.to_error_payload();
        assert_eq!(payload["error"], "Server error");
        assert!(payload["details"]
            .as_str()
            .unwrap()
            .contains("socket closed"));
    }
}
