//! HTTP error taxonomy (spec §7): validation -> 400 full detail, unauthorized
//! -> 401 "access denied" only, not-found -> 404, conflict/invalid-state ->
//! 409 with state name, downstream-failure -> 503. Every branch logs the
//! detailed cause server-side before the client-facing message is built.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use persistence::repositories::ride::RideRepoError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("downstream failure: {0}")]
    ServiceUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Unauthorized(msg) => {
                tracing::warn!(cause = %msg, "unauthorized");
                (StatusCode::UNAUTHORIZED, "unauthorized", "access denied".to_string())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(cause = %msg, "downstream failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "operation failed".to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(cause = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "operation failed".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: code.into(), message })).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("resource not found".into()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RideRepoError> for ApiError {
    fn from(err: RideRepoError) -> Self {
        match err {
            RideRepoError::NotFound => ApiError::NotFound("ride not found".to_string()),
            RideRepoError::InvalidTransition => ApiError::Conflict("invalid-state".to_string()),
            RideRepoError::NotBillable => ApiError::Conflict("not-billable".to_string()),
            RideRepoError::Db(db) => ApiError::from(db),
        }
    }
}

impl From<bus::BusError> for ApiError {
    fn from(err: bus::BusError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}
