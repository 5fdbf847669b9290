//! Ephemeral key/value + geospatial index for the ride-hailing core (spec
//! §3 "AvailabilityEntry"/"ActiveRideLock"/"LastKnownLocation", §4.1
//! "Availability operations", §4.3 "Geospatial index").
//!
//! Built on `deadpool-redis`, grounded on the GEOADD/`store_presence` shape
//! in `examples/other_examples/819445e5_...-apps-platform-src-server.rs.rs`:
//! a pooled Redis connection, one `GEOADD` per role for the radius query and
//! a parallel `SET`/`SETEX` for membership + TTL-healing.

pub mod availability;
pub mod locks;
pub mod location;
pub mod otp;

use deadpool_redis::{Config as RedisPoolConfig, Pool, Runtime};
use domain::models::Role;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct GeoIndexConfig {
    pub redis_url: String,
    pub pool_max_size: usize,
}

impl Default for GeoIndexConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            pool_max_size: 16,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeoIndexError {
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
    #[error("redis command error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("redis config error: {0}")]
    Config(#[from] deadpool_redis::CreatePoolError),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Handle shared by every service that touches the ephemeral store
/// (match-svc: availability pools + locks; location-svc: last-known
/// location; users-svc: OTP).
#[derive(Clone)]
pub struct GeoIndex {
    pool: Pool,
}

impl GeoIndex {
    pub fn connect(config: &GeoIndexConfig) -> Result<Self, GeoIndexError> {
        let pool = RedisPoolConfig::from_url(&config.redis_url).create_pool(Some(Runtime::Tokio1))?;
        Ok(Self { pool })
    }

    pub(crate) async fn conn(&self) -> Result<deadpool_redis::Connection, GeoIndexError> {
        Ok(self.pool.get().await?)
    }

    /// Liveness check for health endpoints.
    pub async fn ping(&self) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

/// Role-parameterized key templates (spec §9 "Polymorphism/role split" —
/// `AddAvailable(role, …)` instead of the source's per-role duplication).
/// Extension trait over `domain::models::Role` so the key layout lives in
/// one place without inventing a second role enum.
pub(crate) trait RoleKeys {
    fn geo_key(self) -> &'static str;
    fn available_set_key(self) -> &'static str;
    fn location_key(self, user_id: Uuid) -> String;
    fn active_lock_key(self, user_id: Uuid) -> String;
}

impl RoleKeys for Role {
    fn geo_key(self) -> &'static str {
        match self {
            Role::Driver => "driver:geo",
            Role::Passenger => "passenger:geo",
        }
    }

    fn available_set_key(self) -> &'static str {
        match self {
            Role::Driver => "available:drivers",
            Role::Passenger => "available:passengers",
        }
    }

    fn location_key(self, user_id: Uuid) -> String {
        match self {
            Role::Driver => format!("driver:location:{user_id}"),
            Role::Passenger => format!("passenger:location:{user_id}"),
        }
    }

    fn active_lock_key(self, user_id: Uuid) -> String {
        match self {
            Role::Driver => format!("active:driver:{user_id}"),
            Role::Passenger => format!("active:passenger:{user_id}"),
        }
    }
}
