use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::ConsoleOtpSender;
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::metrics::metrics_middleware;
use crate::routes::{auth, health, users, ws};
use crate::services::{OtpService, WsRegistry};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub geo: geo_index::GeoIndex,
    pub bus: bus::Bus,
    pub jwt_config: Arc<shared::jwt::JwtConfig>,
    pub config: Arc<Config>,
    pub registry: WsRegistry,
    pub otp: Arc<OtpService>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    geo: geo_index::GeoIndex,
    bus: bus::Bus,
    registry: WsRegistry,
) -> Router {
    let config = Arc::new(config);

    let jwt_config = Arc::new(
        shared::jwt::JwtConfig::new(
            &config.jwt.private_key,
            &config.jwt.public_key,
            config.jwt.access_token_expiry_secs,
            config.jwt.refresh_token_expiry_secs,
        )
        .expect("invalid JWT key configuration"),
    );

    let otp = Arc::new(OtpService::new(
        geo.clone(),
        Arc::new(ConsoleOtpSender),
        config.otp.ttl_secs,
    ));

    let state = AppState {
        pool,
        geo,
        bus,
        jwt_config,
        config: config.clone(),
        registry,
        otp,
    };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(crate::middleware::metrics::metrics_handler))
        .route("/api/v1/auth/otp/request", post(auth::request_otp))
        .route("/api/v1/auth/otp/verify", post(auth::verify_otp))
        .route("/ws", get(ws::ws_handler));

    let authenticated_routes = Router::new()
        .route("/api/v1/users/me", get(users::get_current_user))
        .route("/api/v1/users/me/upgrade", post(users::upgrade_to_driver))
        .route_layer(middleware::from_fn_with_state(state.clone(), users::require_jwt));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
