use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::session::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown identity and wrong secret collapse into this one variant;
    /// the response never says which.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Absent, expired, and corrupt tokens all land here.
    #[error("session not found")]
    SessionNotFound,

    /// Persistence-layer failure. A 5xx, never a login redirect.
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_credentials",
                "invalid username or password".to_string(),
            ),
            AppError::SessionNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "session_not_found",
                "session not found".to_string(),
            ),
            AppError::StorageUnavailable(e) => {
                tracing::error!("session storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "storage_unavailable",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
