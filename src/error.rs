//! Application error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statistics Canada API returned {status}: {reason}")]
    Upstream { status: u16, reason: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("A fetch is already in progress")]
    FetchInFlight,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error envelope returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::FetchInFlight => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Serialization(_)
            | AppError::Io(_)
            | AppError::Config(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        match &err {
            AppError::Http(source) => {
                ErrorResponse::with_details("Internal server error", source.to_string())
            }
            AppError::Io(source) => {
                ErrorResponse::with_details("Internal server error", source.to_string())
            }
            AppError::Serialization(source) => {
                ErrorResponse::with_details("Internal server error", source.to_string())
            }
            _ => ErrorResponse::new(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::from(self);
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_error_relays_status() {
        let err = AppError::Upstream {
            status: 503,
            reason: "Service Unavailable".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        let envelope = ErrorResponse::from(err);
        assert!(envelope.error.contains("503"));
    }

    #[test]
    fn validation_error_is_bad_request() {
        let err = AppError::Validation("no vectors selected".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn in_flight_is_conflict() {
        assert_eq!(AppError::FetchInFlight.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn unknown_upstream_status_falls_back_to_bad_gateway() {
        let err = AppError::Upstream {
            status: 0,
            reason: "bogus".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
