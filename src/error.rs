//! Error types for mm-relay
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::data::StoreError;
use crate::remote::RemoteError;

/// Application-wide error type
///
/// Each handler returns this and axum turns it into a status code plus
/// a `{"message": ...}` body; nothing crosses a request boundary uncaught.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad credentials at login (401)
    #[error("{0}")]
    AuthenticationFailed(String),

    /// Missing/invalid bearer token or no bound remote client (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Referenced user or channel absent (404)
    #[error("{0}")]
    NotFound(String),

    /// Malformed request body (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote chat server call failed (500)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Local store constraint violation (500)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Authentication(msg) => AppError::AuthenticationFailed(msg),
            RemoteError::NotAuthenticated => AppError::Unauthorized,
            RemoteError::Upstream(msg) => AppError::Upstream(msg),
            RemoteError::Timeout(msg) => AppError::Upstream(msg),
        }
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Maps each error variant to appropriate HTTP status code
    /// and JSON error body.
    fn into_response(self) -> Response {
        use axum::Json;

        let (status, message, error_type) = match &self {
            AppError::AuthenticationFailed(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "authentication")
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string(), "unauthorized"),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), "not_found"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), "validation"),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Upstream call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "upstream")
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Store error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), "store")
            }
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone(), "config"),
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "internal",
                )
            }
        };

        use crate::metrics::ERRORS_TOTAL;
        ERRORS_TOTAL.with_label_values(&[error_type]).inc();

        let body = Json(serde_json::json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
