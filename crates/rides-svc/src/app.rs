use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, routing::post, Router};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::metrics::metrics_middleware;
use crate::routes::{health, rides};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub bus: bus::Bus,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, pool: PgPool, bus: bus::Bus) -> Router {
    let config = Arc::new(config);
    let state = AppState { pool, bus, config: config.clone() };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(crate::middleware::metrics::metrics_handler))
        .route("/internal/rides/:id/confirm", post(rides::confirm))
        .route("/internal/rides/:id/arrive", post(rides::arrive))
        .route("/internal/rides/:id/payment", post(rides::payment))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
