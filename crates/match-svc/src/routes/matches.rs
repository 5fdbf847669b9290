//! `POST /internal/matches/{id}/confirm` (spec §6): the two-sided
//! confirmation protocol's HTTP face. A single endpoint carries both the
//! accept and reject paths, discriminated by `status` in the body, matching
//! the table in spec §6 exactly (`{userId, status} -> 200 MatchProposal`).

use axum::extract::{Path, State};
use axum::Json;
use bus::events::{MatchAccepted, MatchRejected};
use bus::Event;
use domain::models::Role;
use persistence::repositories::match_proposal::MatchRepository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::api_key::ApiKeyAuth;

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct MatchProposalResponse {
    pub id: Uuid,
    #[serde(rename = "driverId")]
    pub driver_id: Uuid,
    #[serde(rename = "passengerId")]
    pub passenger_id: Uuid,
    pub status: String,
    #[serde(rename = "driverConfirmed")]
    pub driver_confirmed: bool,
    #[serde(rename = "passengerConfirmed")]
    pub passenger_confirmed: bool,
}

impl From<domain::models::MatchProposal> for MatchProposalResponse {
    fn from(p: domain::models::MatchProposal) -> Self {
        Self {
            id: p.id,
            driver_id: p.driver_id,
            passenger_id: p.passenger_id,
            status: p.status.to_string(),
            driver_confirmed: p.driver_confirmed,
            passenger_confirmed: p.passenger_confirmed,
        }
    }
}

pub async fn confirm(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(match_id): Path<Uuid>,
    Json(body): Json<ConfirmBody>,
) -> Result<Json<MatchProposalResponse>, ApiError> {
    let repo = MatchRepository::new(state.pool.clone());

    let status = body.status.to_uppercase();
    let proposal = match status.as_str() {
        "REJECTED" => {
            let before = repo
                .find_by_id(match_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("match not found".to_string()))?
                .into_domain();
            let was_already_terminal = before.status.is_terminal();

            let updated = repo.reject(match_id).await?.into_domain();
            if !was_already_terminal && updated.status == domain::models::MatchStatus::Rejected {
                state
                    .bus
                    .publish(&Event::MatchRejected(MatchRejected {
                        match_id: updated.id,
                        driver_id: updated.driver_id,
                        passenger_id: updated.passenger_id,
                    }))
                    .await?;
            }
            updated
        }
        "ACCEPTED" => {
            let existing = repo
                .find_by_id(match_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("match not found".to_string()))?
                .into_domain();

            let is_driver = if body.user_id == existing.driver_id {
                true
            } else if body.user_id == existing.passenger_id {
                false
            } else {
                return Err(ApiError::Forbidden(
                    "confirming user is not the counterparty on this match".to_string(),
                ));
            };

            let updated = repo.confirm(match_id, body.user_id, is_driver).await?.into_domain();
            if updated.status == domain::models::MatchStatus::Accepted {
                finalize_acceptance(&state, &updated).await?;
            }
            updated
        }
        other => return Err(ApiError::Validation(format!("unrecognized status: {other}"))),
    };

    Ok(Json(proposal.into()))
}

/// Runs spec §4.1's post-commit side effects: both users leave their
/// availability pools, the active-ride-lock pair is written under a
/// match-svc-minted `ride_id`, and `match.accepted` is published last.
/// Postgres and Redis are separate systems with no shared transaction, so
/// this is a best-effort sequence rather than atomic with the DB commit —
/// a crash between steps leaves stale pool entries that TTL-healing clears
/// (spec §5 "CAS-free but TTL-healing compensates").
async fn finalize_acceptance(state: &AppState, proposal: &domain::models::MatchProposal) -> Result<(), ApiError> {
    let ride_id = Uuid::new_v4();

    state.geo.remove_available(Role::Driver, proposal.driver_id).await?;
    state.geo.remove_available(Role::Passenger, proposal.passenger_id).await?;
    state.geo.set_active_ride_lock(Role::Driver, proposal.driver_id, ride_id).await?;
    state
        .geo
        .set_active_ride_lock(Role::Passenger, proposal.passenger_id, ride_id)
        .await?;

    state
        .bus
        .publish(&Event::MatchAccepted(MatchAccepted {
            match_id: proposal.id,
            driver_id: proposal.driver_id,
            passenger_id: proposal.passenger_id,
            ride_id,
        }))
        .await?;

    Ok(())
}
