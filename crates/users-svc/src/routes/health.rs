//! Health check endpoints (teacher's `routes::health` shape, trimmed to
//! the dependencies this service actually has: Postgres and Redis).

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database_connected: bool,
    pub redis_connected: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, StatusCode> {
    let database_connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let redis_connected = state.geo.ping().await.is_ok();

    let response = HealthResponse {
        status: if database_connected && redis_connected {
            "healthy"
        } else {
            "unhealthy"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database_connected,
        redis_connected,
    };

    if database_connected && redis_connected {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}

pub async fn live() -> Json<StatusResponse> {
    Json(StatusResponse { status: "alive".to_string() })
}

pub async fn ready(State(state): State<AppState>) -> Result<Json<StatusResponse>, StatusCode> {
    let database_connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    if database_connected {
        Ok(Json(StatusResponse { status: "ready".to_string() }))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
