//! Layered configuration for users-svc (teacher's `config::Config::load`
//! pattern: `config/default.toml` -> `config/local.toml` (optional) ->
//! `USERS__`-prefixed env vars).

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub bus: BusConfig,
    pub jwt: JwtAuthConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    pub logging: LoggingConfig,
    /// `api_keys{service -> key}` (spec §9): the keys *this* service issues
    /// to callers, not the keys it presents outbound.
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
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
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

#[derive(Debug, Clone, Deserialize)]
pub struct JwtAuthConfig {
    pub private_key: String,
    pub public_key: String,
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: i64,
    #[serde(default = "default_refresh_token_expiry")]
    pub refresh_token_expiry_secs: i64,
    #[serde(default = "default_jwt_leeway")]
    pub leeway_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_ttl")]
    pub ttl_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_otp_ttl(),
        }
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
    8081
}
fn default_request_timeout() -> u64 {
    10
}
fn default_shutdown_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
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
fn default_access_token_expiry() -> i64 {
    900
}
fn default_refresh_token_expiry() -> i64 {
    604800
}
fn default_jwt_leeway() -> u64 {
    30
}
fn default_otp_ttl() -> u64 {
    300
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
            .add_source(config::Environment::with_prefix("USERS").separator("__"))
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
            port = 8081

            [database]
            url = "postgres://test/test"

            [redis]
            url = "redis://127.0.0.1:6379"

            [bus]
            nats_url = "nats://127.0.0.1:4222"

            [jwt]
            private_key = "test-private-key"
            public_key = "test-public-key"

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
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "USERS__DATABASE__URL must be set".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue("server port cannot be 0".to_string()));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
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
