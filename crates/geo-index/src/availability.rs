//! Availability pools: the geo index + available-set + last-known-location
//! triple that match-svc and location-svc maintain per role (spec §4.1
//! "Availability operations", §4.3 "Geospatial index").

use chrono::Utc;
use domain::models::{AvailabilityEntry, NearbyCandidate, Role};
use redis::AsyncCommands;
use shared::geo::GeoPoint;
use uuid::Uuid;

use crate::{GeoIndex, GeoIndexError, RoleKeys};

impl GeoIndex {
    /// `AddAvailableDriver`/`AddAvailablePassenger` unified behind `role`
    /// (spec §4.1): writes the geo index, the available-set, and the
    /// last-known-location key, all with a uniform TTL so a missed removal
    /// self-heals (spec §4.3 "TTL is set on all geo/set/hash keys").
    pub async fn add_available(
        &self,
        role: Role,
        user_id: Uuid,
        location: GeoPoint,
        ttl_secs: u64,
    ) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let member = user_id.to_string();

        let _: () = redis::cmd("GEOADD")
            .arg(role.geo_key())
            .arg(location.lng)
            .arg(location.lat)
            .arg(&member)
            .query_async(&mut conn)
            .await?;
        // GEOADD has no per-member TTL; EXPIRE on the whole key re-arms the
        // self-heal window on every write, which is correct for a
        // single-pool-per-role key (the spec's TTL-healing only requires
        // that stale entries eventually vanish, not per-member precision).
        let _: () = conn.expire(role.geo_key(), ttl_secs as i64).await?;

        let _: () = conn.sadd(role.available_set_key(), &member).await?;
        let _: () = conn.expire(role.available_set_key(), ttl_secs as i64).await?;

        let entry = AvailabilityEntry {
            user_id,
            role,
            location,
            ts: Utc::now().timestamp(),
            ttl_secs,
        };
        let payload = serde_json::to_string(&entry)?;
        let _: () = conn
            .set_ex(role.location_key(user_id), payload, ttl_secs)
            .await?;

        Ok(())
    }

    /// Explicit removal from the geo index, the available-set, and the
    /// last-known-location key (spec §4.1 "Remove…").
    pub async fn remove_available(&self, role: Role, user_id: Uuid) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let member = user_id.to_string();

        let _: () = conn.zrem(role.geo_key(), &member).await?;
        let _: () = conn.srem(role.available_set_key(), &member).await?;
        let _: () = conn.del(role.location_key(user_id)).await?;

        Ok(())
    }

    /// Membership check used by the proposal algorithm to skip stale geo
    /// entries whose TTL has not yet fired (spec §4.1 step 2).
    pub async fn is_available(&self, role: Role, user_id: Uuid) -> Result<bool, GeoIndexError> {
        let mut conn = self.conn().await?;
        let is_member: bool = conn
            .sismember(role.available_set_key(), user_id.to_string())
            .await?;
        Ok(is_member)
    }

    /// `GeoRadius(key, lng, lat, radius_km) -> [{name, dist}]` sorted
    /// ascending by distance (spec §4.3), used to find candidates of
    /// `role` within range of `location`.
    pub async fn nearby(
        &self,
        role: Role,
        location: GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<NearbyCandidate>, GeoIndexError> {
        let mut conn = self.conn().await?;

        let raw: Vec<(String, f64, (f64, f64))> = redis::cmd("GEORADIUS")
            .arg(role.geo_key())
            .arg(location.lng)
            .arg(location.lat)
            .arg(radius_km)
            .arg("km")
            .arg("WITHCOORD")
            .arg("WITHDIST")
            .arg("ASC")
            .query_async(&mut conn)
            .await?;

        let mut candidates = Vec::with_capacity(raw.len());
        for (member, distance_km, (lng, lat)) in raw {
            let Ok(user_id) = member.parse::<Uuid>() else {
                continue;
            };
            candidates.push(NearbyCandidate {
                user_id,
                location: GeoPoint::new(lat, lng),
                distance_km,
            });
        }
        Ok(candidates)
    }

    pub async fn last_known_location(
        &self,
        role: Role,
        user_id: Uuid,
    ) -> Result<Option<AvailabilityEntry>, GeoIndexError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(role.location_key(user_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `AvailabilityEntry` must round-trip through the JSON stored in the
    /// last-known-location key — a regression here would silently break
    /// every `last_known_location` read.
    #[test]
    fn availability_entry_round_trips_json() {
        let entry = AvailabilityEntry {
            user_id: Uuid::new_v4(),
            role: Role::Driver,
            location: GeoPoint::new(-6.2, 106.8),
            ts: 1_700_000_000,
            ttl_secs: 1800,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: AvailabilityEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back.user_id, entry.user_id);
        assert_eq!(back.ttl_secs, 1800);
    }
}
