//! Active-ride locks (spec §3 "ActiveRideLock"): `active:driver:{id}` /
//! `active:passenger:{id}` -> `ride_id`, no TTL, single-writer (match-svc on
//! accept), single-deleter (match-svc on `ride.completed`).

use domain::models::Role;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::{GeoIndex, GeoIndexError, RoleKeys};

impl GeoIndex {
    /// Written only inside the confirmation transaction's post-commit step
    /// (spec §4.1 "insert the active-ride-lock pair").
    pub async fn set_active_ride_lock(
        &self,
        role: Role,
        user_id: Uuid,
        ride_id: Uuid,
    ) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let _: () = conn
            .set(role.active_lock_key(user_id), ride_id.to_string())
            .await?;
        Ok(())
    }

    pub async fn get_active_ride_lock(
        &self,
        role: Role,
        user_id: Uuid,
    ) -> Result<Option<Uuid>, GeoIndexError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(role.active_lock_key(user_id)).await?;
        Ok(raw.and_then(|s| s.parse().ok()))
    }

    /// Deleted only by match-svc's `ride.completed` consumer (spec §4.1
    /// "Pool release").
    pub async fn release_active_ride_lock(&self, role: Role, user_id: Uuid) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let _: () = conn.del(role.active_lock_key(user_id)).await?;
        Ok(())
    }
}
