use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, routing::post, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::metrics::metrics_middleware;
use crate::routes::{availability, health};

#[derive(Clone)]
pub struct AppState {
    pub geo: geo_index::GeoIndex,
    pub bus: bus::Bus,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, geo: geo_index::GeoIndex, bus: bus::Bus) -> Router {
    let config = Arc::new(config);
    let state = AppState { geo, bus, config: config.clone() };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(crate::middleware::metrics::metrics_handler))
        .route(
            "/internal/drivers/:id/available",
            post(availability::add_driver).delete(availability::remove_driver),
        )
        .route(
            "/internal/passengers/:id/available",
            post(availability::add_passenger).delete(availability::remove_passenger),
        )
        .route("/internal/drivers/nearby", get(availability::nearby_drivers))
        .route("/internal/drivers/:id/location", get(availability::driver_location))
        .route("/internal/passengers/:id/location", get(availability::passenger_location))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
