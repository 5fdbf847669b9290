//! Layered configuration for location-svc (teacher's `Config::load` pattern:
//! `config/default.toml` -> `config/local.toml` (optional) ->
//! `LOCATION__`-prefixed env vars).

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub redis: RedisConfig,
    pub bus: BusConfig,
    #[serde(default)]
    pub location: LocationConfig,
    pub logging: LoggingConfig,
    /// `api_keys{service -> key}` (spec §9): keys this service accepts from
    /// callers on `X-API-Key`.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_pool_size")]
    pub pool_max_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusConfig {
    pub nats_url: String,
    #[serde(default = "default_ack_wait")]
    pub ack_wait_secs: u64,
    #[serde(default = "default_max_deliver")]
    pub max_deliver: i64,
}

/// Recognized location knobs (spec §4.1 "Availability operations").
#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_availability_ttl_minutes")]
    pub availability_ttl_minutes: u64,
    #[serde(default = "default_nearby_radius_km")]
    pub default_nearby_radius_km: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            availability_ttl_minutes: default_availability_ttl_minutes(),
            default_nearby_radius_km: default_nearby_radius_km(),
        }
    }
}

impl LocationConfig {
    pub fn availability_ttl_secs(&self) -> u64 {
        self.availability_ttl_minutes * 60
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8083
}
fn default_request_timeout() -> u64 {
    10
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_redis_pool_size() -> usize {
    16
}
fn default_ack_wait() -> u64 {
    30
}
fn default_max_deliver() -> i64 {
    5
}
fn default_availability_ttl_minutes() -> u64 {
    30
}
fn default_nearby_radius_km() -> f64 {
    1.0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("missing required configuration: {0}")]
    MissingRequired(String),
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("LOCATION").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8083

            [redis]
            url = "redis://127.0.0.1:6379"

            [bus]
            nats_url = "nats://127.0.0.1:4222"

            [logging]
            level = "info"
            format = "pretty"
        "#;

        let mut builder =
            config::Config::builder().add_source(config::File::from_str(defaults, config::FileFormat::Toml));
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        builder.build()?.try_deserialize()
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.redis.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "LOCATION__REDIS__URL must be set".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue("server port cannot be 0".to_string()));
        }
        if self.location.default_nearby_radius_km <= 0.0 {
            return Err(ConfigValidationError::InvalidValue(
                "location.default_nearby_radius_km must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .expect("invalid socket address")
    }
}
