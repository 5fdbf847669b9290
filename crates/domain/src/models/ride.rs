//! Ride lifecycle domain model and state machine (spec §3 "Ride", §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum RideStatus {
    Pending,
    Pickup,
    Ongoing,
    Completed,
}

impl std::str::FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RideStatus::Pending),
            "PICKUP" => Ok(RideStatus::Pickup),
            "ONGOING" => Ok(RideStatus::Ongoing),
            "COMPLETED" => Ok(RideStatus::Completed),
            other => Err(format!("unknown ride status: {other}")),
        }
    }
}

impl std::fmt::Display for RideStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RideStatus::Pending => "PENDING",
            RideStatus::Pickup => "PICKUP",
            RideStatus::Ongoing => "ONGOING",
            RideStatus::Completed => "COMPLETED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub ride_id: Uuid,
    pub match_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub status: RideStatus,
    pub total_cost_minor_units: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Out-of-order transitions are forbidden (spec §4.2). `None` means no
/// legal transition exists and the caller must surface `invalid-state`.
pub fn next_status(current: RideStatus, event: RideEvent) -> Option<RideStatus> {
    use RideEvent::*;
    use RideStatus::*;
    match (current, event) {
        (Pending, MatchAccepted) => Some(Pickup),
        (Pickup, DriverStarts) => Some(Ongoing),
        (Ongoing, Arrived) => Some(Completed),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideEvent {
    MatchAccepted,
    DriverStarts,
    Arrived,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions() {
        assert_eq!(
            next_status(RideStatus::Pending, RideEvent::MatchAccepted),
            Some(RideStatus::Pickup)
        );
        assert_eq!(
            next_status(RideStatus::Pickup, RideEvent::DriverStarts),
            Some(RideStatus::Ongoing)
        );
        assert_eq!(
            next_status(RideStatus::Ongoing, RideEvent::Arrived),
            Some(RideStatus::Completed)
        );
    }

    #[test]
    fn backwards_transition_is_rejected() {
        assert_eq!(next_status(RideStatus::Ongoing, RideEvent::MatchAccepted), None);
        assert_eq!(next_status(RideStatus::Completed, RideEvent::Arrived), None);
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        assert_eq!(next_status(RideStatus::Pending, RideEvent::DriverStarts), None);
        assert_eq!(next_status(RideStatus::Pickup, RideEvent::Arrived), None);
    }
}
