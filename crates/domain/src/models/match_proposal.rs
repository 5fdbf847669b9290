//! MatchProposal domain model and its confirmation state machine
//! (spec §3 "MatchProposal", §4.1 "Confirmation protocol").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Pending,
    DriverConfirmed,
    PassengerConfirmed,
    Accepted,
    Rejected,
}

impl MatchStatus {
    /// Terminal statuses are immutable (spec §3 invariant).
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::Accepted | MatchStatus::Rejected)
    }
}

impl std::str::FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(MatchStatus::Pending),
            "DRIVER_CONFIRMED" => Ok(MatchStatus::DriverConfirmed),
            "PASSENGER_CONFIRMED" => Ok(MatchStatus::PassengerConfirmed),
            "ACCEPTED" => Ok(MatchStatus::Accepted),
            "REJECTED" => Ok(MatchStatus::Rejected),
            other => Err(format!("unknown match status: {other}")),
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MatchStatus::Pending => "PENDING",
            MatchStatus::DriverConfirmed => "DRIVER_CONFIRMED",
            MatchStatus::PassengerConfirmed => "PASSENGER_CONFIRMED",
            MatchStatus::Accepted => "ACCEPTED",
            MatchStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProposal {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub driver_location: GeoPoint,
    pub passenger_location: GeoPoint,
    pub target_location: GeoPoint,
    pub status: MatchStatus,
    pub driver_confirmed: bool,
    pub passenger_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Errors produced while applying the confirmation protocol — these map
/// 1:1 onto spec §4.1 "Failure modes" and are turned into HTTP status codes
/// by the match-svc error taxonomy (spec §7).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfirmError {
    #[error("match already confirmed by this side")]
    AlreadyConfirmed,
    #[error("match is in a terminal state")]
    Terminal,
    #[error("confirming user is not the counterparty on this match")]
    Unauthorized,
}

/// Pure confirmation-protocol transition, run under the match row lock
/// (spec §4.1 transition table). Returns the new status and the updated
/// confirmed flags; callers persist the result inside the same transaction
/// that acquired the lock.
pub fn apply_confirmation(
    proposal: &MatchProposal,
    confirming_user_id: Uuid,
    is_driver: bool,
) -> Result<(MatchStatus, bool, bool), ConfirmError> {
    if proposal.status.is_terminal() {
        return Err(ConfirmError::Terminal);
    }

    let expected_id = if is_driver {
        proposal.driver_id
    } else {
        proposal.passenger_id
    };
    if confirming_user_id != expected_id {
        return Err(ConfirmError::Unauthorized);
    }

    let (already_confirmed, other_confirmed) = if is_driver {
        (proposal.driver_confirmed, proposal.passenger_confirmed)
    } else {
        (proposal.passenger_confirmed, proposal.driver_confirmed)
    };

    if already_confirmed {
        return Err(ConfirmError::AlreadyConfirmed);
    }

    let (driver_confirmed, passenger_confirmed) = if is_driver {
        (true, proposal.passenger_confirmed)
    } else {
        (proposal.driver_confirmed, true)
    };

    let new_status = if other_confirmed {
        MatchStatus::Accepted
    } else if is_driver {
        MatchStatus::DriverConfirmed
    } else {
        MatchStatus::PassengerConfirmed
    };

    Ok((new_status, driver_confirmed, passenger_confirmed))
}

/// Applying a rejection from either side always goes straight to REJECTED;
/// a second rejection after REJECTED is a no-op success (spec §4.1).
pub fn apply_rejection(proposal: &MatchProposal) -> MatchStatus {
    if proposal.status == MatchStatus::Accepted {
        // Accepted is immutable; a stray reject after acceptance is ignored
        // by the caller (it will not persist this as a no-op state change).
        proposal.status
    } else {
        MatchStatus::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_proposal() -> MatchProposal {
        MatchProposal {
            id: Uuid::new_v4(),
            driver_id: Uuid::new_v4(),
            passenger_id: Uuid::new_v4(),
            driver_location: GeoPoint::new(-6.20, 106.80),
            passenger_location: GeoPoint::new(-6.21, 106.81),
            target_location: GeoPoint::new(-6.22, 106.82),
            status: MatchStatus::Pending,
            driver_confirmed: false,
            passenger_confirmed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn first_driver_confirm_moves_to_driver_confirmed() {
        let p = base_proposal();
        let (status, d, pa) = apply_confirmation(&p, p.driver_id, true).unwrap();
        assert_eq!(status, MatchStatus::DriverConfirmed);
        assert!(d);
        assert!(!pa);
    }

    #[test]
    fn second_side_confirm_accepts() {
        let mut p = base_proposal();
        p.status = MatchStatus::DriverConfirmed;
        p.driver_confirmed = true;
        let (status, d, pa) = apply_confirmation(&p, p.passenger_id, false).unwrap();
        assert_eq!(status, MatchStatus::Accepted);
        assert!(d && pa);
    }

    #[test]
    fn duplicate_confirm_is_rejected() {
        let mut p = base_proposal();
        p.driver_confirmed = true;
        p.status = MatchStatus::DriverConfirmed;
        let err = apply_confirmation(&p, p.driver_id, true).unwrap_err();
        assert_eq!(err, ConfirmError::AlreadyConfirmed);
    }

    #[test]
    fn confirming_terminal_match_errors() {
        let mut p = base_proposal();
        p.status = MatchStatus::Accepted;
        p.driver_confirmed = true;
        p.passenger_confirmed = true;
        let err = apply_confirmation(&p, p.passenger_id, false).unwrap_err();
        assert_eq!(err, ConfirmError::Terminal);
    }

    #[test]
    fn counterparty_mismatch_is_unauthorized() {
        let p = base_proposal();
        let stranger = Uuid::new_v4();
        let err = apply_confirmation(&p, stranger, true).unwrap_err();
        assert_eq!(err, ConfirmError::Unauthorized);
    }

    #[test]
    fn reject_after_accepted_is_noop() {
        let mut p = base_proposal();
        p.status = MatchStatus::Accepted;
        assert_eq!(apply_rejection(&p), MatchStatus::Accepted);
    }

    #[test]
    fn reject_from_pending_is_rejected() {
        let p = base_proposal();
        assert_eq!(apply_rejection(&p), MatchStatus::Rejected);
    }
}
