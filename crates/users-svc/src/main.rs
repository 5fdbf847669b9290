use anyhow::Result;
use tracing::info;

mod app;
mod bus_consumers;
mod config;
mod error;
mod middleware;
mod routes;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();
    info!("Prometheus metrics initialized");

    info!("Starting users-svc v{}", env!("CARGO_PKG_VERSION"));

    let db_config = persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    };
    let pool = persistence::db::create_pool(&db_config).await?;

    let geo_config = geo_index::GeoIndexConfig {
        redis_url: config.redis.url.clone(),
        pool_max_size: config.redis.pool_max_size,
    };
    let geo = geo_index::GeoIndex::connect(&geo_config)?;

    let bus_config = bus::BusConfig {
        nats_url: config.bus.nats_url.clone(),
        ack_wait_secs: config.bus.ack_wait_secs,
        max_deliver: config.bus.max_deliver,
    };
    let bus = bus::Bus::connect(&bus_config).await?;
    let registry = services::WsRegistry::new();

    bus_consumers::fanout::spawn_all(bus.clone(), bus_config, registry.clone(), pool.clone());

    let app = app::create_app(config.clone(), pool.clone(), geo, bus, registry);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        tokio::signal::ctrl_c().await.expect("failed to install CTRL+C signal handler");
        info!("received shutdown signal");
    };

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal).await?;

    info!("users-svc shutdown complete");
    Ok(())
}
