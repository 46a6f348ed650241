//! Application error handling
//!
//! Converts internal errors to HTTP responses with machine-readable
//! codes in the body. Auth failures carry the shared `AuthCode`
//! taxonomy; the client session agent branches on the `TOKEN_EXPIRED`
//! code specifically, so the mapping here is part of the wire contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jobdeck_shared::AuthCode;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Auth(AuthCode),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail
#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // WEAK_PASSWORD is a request defect, not an auth failure.
            ApiError::Auth(AuthCode::WeakPassword) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            ApiError::Validation(msg) => ("VALIDATION_ERROR".to_string(), msg.clone()),
            ApiError::NotFound(msg) => ("NOT_FOUND".to_string(), msg.clone()),
            ApiError::Auth(auth) => (auth.as_str().to_string(), auth.to_string()),
            ApiError::Conflict(msg) => ("CONFLICT".to_string(), msg.clone()),
            ApiError::BadRequest(msg) => ("BAD_REQUEST".to_string(), msg.clone()),
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                (
                    "INTERNAL_ERROR".to_string(),
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                (
                    "DATABASE_ERROR".to_string(),
                    "A database error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail { code, message },
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
