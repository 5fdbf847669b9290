//! Per-ride "previous location" key used to derive segment distance (spec
//! §3 "LastKnownLocation", §4.3 "StoreLocation"). TTL 24h, separate from the
//! per-user last-known-location key in `availability.rs` (that one tracks
//! availability-pool freshness; this one tracks ride-segment continuity).

use redis::AsyncCommands;
use shared::geo::GeoPoint;
use uuid::Uuid;

use crate::{GeoIndex, GeoIndexError};

/// TTL for `ride:location:{ride_id}`, per spec §3.
pub const RIDE_LOCATION_TTL_SECS: u64 = 24 * 60 * 60;

fn ride_location_key(ride_id: Uuid) -> String {
    format!("ride:location:{ride_id}")
}

impl GeoIndex {
    /// The "previous location" read in spec §4.3 step 1.
    pub async fn ride_previous_location(&self, ride_id: Uuid) -> Result<Option<GeoPoint>, GeoIndexError> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(ride_location_key(ride_id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrites the previous-location key with the new current sample
    /// (spec §4.3 steps 2-3, run regardless of whether a previous location
    /// existed).
    pub async fn store_ride_location(&self, ride_id: Uuid, location: GeoPoint) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let payload = serde_json::to_string(&location)?;
        let _: () = conn
            .set_ex(ride_location_key(ride_id), payload, RIDE_LOCATION_TTL_SECS)
            .await?;
        Ok(())
    }
}
