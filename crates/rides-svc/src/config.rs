//! Layered configuration for rides-svc (teacher's `Config::load` pattern:
//! `config/default.toml` -> `config/local.toml` (optional) ->
//! `RIDES__`-prefixed env vars).

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub bus: BusConfig,
    #[serde(default)]
    pub billing: BillingConfig,
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
pub struct BusConfig {
    pub nats_url: String,
    #[serde(default = "default_ack_wait")]
    pub ack_wait_secs: u64,
    #[serde(default = "default_max_deliver")]
    pub max_deliver: i64,
}

/// Recognized billing knobs (spec §3 "BillingLedgerEntry"/"Payment", §4.2
/// "Billing aggregation"/"Arrival & settlement").
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_min_distance_km")]
    pub min_distance_km: f64,
    #[serde(default = "default_rate_per_km")]
    pub rate_per_km: f64,
    #[serde(default = "default_admin_fee_percent")]
    pub admin_fee_percent: f64,
    /// Used only when a caller omits `adjustment_factor` on
    /// `/rides/{id}/arrive`; the request value is still validated against
    /// spec §9's resolved `[0, 1.5]` bound regardless of this default.
    #[serde(default = "default_adjustment_factor")]
    pub default_adjustment_factor: f64,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            min_distance_km: default_min_distance_km(),
            rate_per_km: default_rate_per_km(),
            admin_fee_percent: default_admin_fee_percent(),
            default_adjustment_factor: default_adjustment_factor(),
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
    8084
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
fn default_ack_wait() -> u64 {
    30
}
fn default_max_deliver() -> i64 {
    5
}
fn default_min_distance_km() -> f64 {
    0.01
}
fn default_rate_per_km() -> f64 {
    3000.0
}
fn default_admin_fee_percent() -> f64 {
    0.05
}
fn default_adjustment_factor() -> f64 {
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
            .add_source(config::Environment::with_prefix("RIDES").separator("__"))
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
            port = 8084

            [database]
            url = "postgres://test/test"

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
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "RIDES__DATABASE__URL must be set".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue("server port cannot be 0".to_string()));
        }
        if self.billing.rate_per_km <= 0.0 {
            return Err(ConfigValidationError::InvalidValue("billing.rate_per_km must be positive".to_string()));
        }
        if !(0.0..=1.5).contains(&self.billing.default_adjustment_factor) {
            return Err(ConfigValidationError::InvalidValue(
                "billing.default_adjustment_factor must be within [0, 1.5]".to_string(),
            ));
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
