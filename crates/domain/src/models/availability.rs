//! Ephemeral availability-pool entry (spec §3 "AvailabilityEntry").
//!
//! Lives only in the geo-index key/value store; this struct is the shape
//! match-svc and location-svc exchange in process, not a database row.

use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub user_id: Uuid,
    pub role: Role,
    pub location: GeoPoint,
    pub ts: i64,
    /// Seconds; default 30 minutes per spec §4.1.
    pub ttl_secs: u64,
}

/// A driver (or passenger) candidate returned by a geo-radius query, sorted
/// ascending by distance from the query point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyCandidate {
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub distance_km: f64,
}
