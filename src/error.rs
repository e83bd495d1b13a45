use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced to the user for a single action.
///
/// Only [`AppError::Config`] is fatal, and only at startup. Everything else
/// is rendered as a message and leaves the session untouched.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing input: {0}")]
    MissingInput(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error("generation service error: {cause}")]
    Service { cause: String },

    #[error("generation service did not answer within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("resource sampling failed: {0}")]
    Sampler(String),

    #[error("{0}")]
    NothingToReport(String),
}

impl AppError {
    pub fn service(cause: impl Into<String>) -> Self {
        AppError::Service {
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::MissingInput(_) => "missing_input",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::UnsupportedImage(_) => "unsupported_image",
            AppError::Service { .. } => "service",
            AppError::Timeout(_) => "timeout",
            AppError::Io(_) => "io",
            AppError::Sampler(_) => "sampler",
            AppError::NothingToReport(_) => "nothing_to_report",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::Service { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Io(_) | AppError::Sampler(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NothingToReport(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::MissingInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::service("down").status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::Timeout(Duration::from_secs(30)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            AppError::NothingToReport("x".into()).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_service_message_carries_cause() {
        let err = AppError::service("quota exceeded");
        assert_eq!(err.to_string(), "generation service error: quota exceeded");
        assert_eq!(err.kind(), "service");
    }
}
