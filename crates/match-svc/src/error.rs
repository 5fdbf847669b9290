//! HTTP error taxonomy (spec §7), identical shape to users-svc's, plus a
//! mapping from the match repository's domain-level `ConfirmError`.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use persistence::repositories::match_proposal::MatchRepoError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
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
            ApiError::Forbidden(msg) => {
                tracing::warn!(cause = %msg, "forbidden");
                (StatusCode::FORBIDDEN, "forbidden", "access denied".to_string())
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

impl From<geo_index::GeoIndexError> for ApiError {
    fn from(err: geo_index::GeoIndexError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl From<bus::BusError> for ApiError {
    fn from(err: bus::BusError) -> Self {
        ApiError::ServiceUnavailable(err.to_string())
    }
}

/// Maps the confirmation protocol's failure modes onto spec §7's taxonomy:
/// already-confirmed/terminal are conflicts on the match's current state,
/// counterparty mismatch is forbidden, not-found is not-found.
impl From<MatchRepoError> for ApiError {
    fn from(err: MatchRepoError) -> Self {
        match err {
            MatchRepoError::NotFound => ApiError::NotFound("match not found".into()),
            MatchRepoError::Confirm(domain::models::ConfirmError::AlreadyConfirmed) => {
                ApiError::Conflict("already confirmed".into())
            }
            MatchRepoError::Confirm(domain::models::ConfirmError::Terminal) => {
                ApiError::Conflict("match is in a terminal state".into())
            }
            MatchRepoError::Confirm(domain::models::ConfirmError::Unauthorized) => {
                ApiError::Forbidden("confirming user is not the counterparty on this match".into())
            }
            MatchRepoError::Db(db_err) => ApiError::from(db_err),
        }
    }
}
