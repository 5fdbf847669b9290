//! Event bus contract: the four durable streams and their subjects (spec
//! §5 "Event bus contract").
//!
//! Each stream maps to one JetStream stream; each variant below maps to
//! one subject within that stream. Consumers are named durables scoped to
//! the subject they read, matching the "one durable per subscriber" shape
//! the bus enforces for replay-safe, independently-acked fan-out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use uuid::Uuid;

/// Stream names as registered with JetStream.
pub mod stream {
    pub const USER: &str = "USER";
    pub const MATCH: &str = "MATCH";
    pub const RIDE: &str = "RIDE";
    pub const LOCATION: &str = "LOCATION";
}

/// Durable consumer names (spec §5 "Consumer groups"): one durable per
/// (subject, subscribing service) pair, never shared across services.
pub mod consumer {
    pub const USER_BEACON_MATCH: &str = "user_beacon_match";
    pub const USER_FINDER_MATCH: &str = "user_finder_match";
    pub const RIDE_PICKUP_MATCH: &str = "ride_pickup_match";
    pub const RIDE_COMPLETED_MATCH: &str = "ride_completed_match";
    pub const MATCH_FOUND_USERS: &str = "match_found_users";
    pub const MATCH_ACCEPTED_USERS: &str = "match_accepted_users";
    pub const MATCH_REJECTED_USERS: &str = "match_rejected_users";
    pub const MATCH_ACCEPTED_RIDES: &str = "match_accepted_rides";
    pub const RIDE_PICKUP_USERS: &str = "ride_pickup_users";
    pub const RIDE_STARTED_USERS: &str = "ride_started_users";
    pub const RIDE_ARRIVED_USERS: &str = "ride_arrived_users";
    pub const RIDE_COMPLETED_USERS: &str = "ride_completed_users";
    pub const LOCATION_AGGREGATE_RIDES: &str = "location_aggregate_rides";
    pub const LOCATION_UPDATE_LOCATION: &str = "location_update_location";
}

/// A driver's periodic "I'm available" beacon (spec §4.1 step 1). `active`
/// toggles availability: `true` joins the driver pool (and, depending on
/// config, triggers the proposal algorithm symmetrically); `false` removes
/// the driver without running it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBeacon {
    pub driver_id: Uuid,
    pub location: GeoPoint,
    pub active: bool,
    pub ts: DateTime<Utc>,
}

/// A passenger's search request (spec §4.1 step 2). `active=true` joins the
/// passenger pool and runs the proposal algorithm against nearby drivers;
/// `active=false` cancels the search and removes the passenger from the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFinder {
    pub passenger_id: Uuid,
    pub pickup: GeoPoint,
    pub destination: GeoPoint,
    pub active: bool,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchFound {
    pub match_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchAccepted {
    pub match_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    /// Minted by match-svc at confirmation time so the active-ride-lock
    /// pair (spec §4.1 "insert the active-ride-lock pair", same transaction
    /// as the ACCEPTED transition) can reference a ride before the Ride row
    /// itself exists; rides-svc creates the row under this exact id rather
    /// than minting its own (spec §4.2 "Creation").
    pub ride_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRejected {
    pub match_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidePickup {
    pub ride_id: Uuid,
    pub match_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideStarted {
    pub ride_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideArrived {
    pub ride_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideCompleted {
    pub ride_id: Uuid,
    pub total_cost_minor_units: i64,
}

/// Raw GPS ping from either side of a ride (spec §4.3 step 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdate {
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub location: GeoPoint,
    pub ts: DateTime<Utc>,
}

/// A computed billable segment, published once location-svc has enough
/// points to derive a distance (spec §4.3 step 2). Carries the current
/// point alongside the segment distance so downstream consumers don't need
/// a second lookup to know where the ride currently is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAggregate {
    pub ride_id: Uuid,
    pub distance_km: f64,
    pub lat: f64,
    pub lng: f64,
    pub ts: DateTime<Utc>,
}

macro_rules! event_enum {
    ($( $variant:ident($payload:ty) => $subject:expr ),+ $(,)?) => {
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #[serde(tag = "type")]
        pub enum Event {
            $( $variant($payload), )+
        }

        impl Event {
            pub fn subject(&self) -> &'static str {
                match self {
                    $( Event::$variant(_) => $subject, )+
                }
            }
        }
    };
}

event_enum! {
    UserBeacon(UserBeacon) => "user.beacon",
    UserFinder(UserFinder) => "user.finder",
    MatchFound(MatchFound) => "match.found",
    MatchAccepted(MatchAccepted) => "match.accepted",
    MatchRejected(MatchRejected) => "match.rejected",
    RidePickup(RidePickup) => "ride.pickup",
    RideStarted(RideStarted) => "ride.started",
    RideArrived(RideArrived) => "ride.arrived",
    RideCompleted(RideCompleted) => "ride.completed",
    LocationUpdate(LocationUpdate) => "location.update",
    LocationAggregate(LocationAggregate) => "location.aggregate",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_round_trips_through_serialization() {
        let event = Event::UserBeacon(UserBeacon {
            driver_id: Uuid::new_v4(),
            location: GeoPoint::new(-6.2, 106.8),
            active: true,
            ts: Utc::now(),
        });
        assert_eq!(event.subject(), "user.beacon");
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back.subject(), event.subject());
    }
}
