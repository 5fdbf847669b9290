//! Ride lifecycle HTTP face (spec §6): `StartRide`, `RideArrived`
//! (settlement), and `ProcessPayment`. Ride creation itself is driven off
//! `match.accepted` on the bus, not HTTP (spec §4.2 "Creation").

use axum::extract::{Path, State};
use axum::Json;
use bus::events::{RideArrived, RideCompleted, RideStarted};
use bus::Event;
use domain::models::{settle, PaymentStatus, RideEvent};
use persistence::repositories::billing_ledger::BillingLedgerRepository;
use persistence::repositories::idempotency_key::IdempotencyKeyRepository;
use persistence::repositories::payment::PaymentRepository;
use persistence::repositories::ride::RideRepository;
use serde::{Deserialize, Serialize};
use shared::crypto::sha256_hex;
use shared::validation::validate_adjustment_factor;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::api_key::ApiKeyAuth;

#[derive(Debug, Serialize)]
pub struct RideResponse {
    #[serde(rename = "rideId")]
    pub ride_id: Uuid,
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "driverId")]
    pub driver_id: Uuid,
    #[serde(rename = "passengerId")]
    pub passenger_id: Uuid,
    pub status: String,
    #[serde(rename = "totalCostMinorUnits")]
    pub total_cost_minor_units: i64,
}

impl From<domain::models::Ride> for RideResponse {
    fn from(r: domain::models::Ride) -> Self {
        Self {
            ride_id: r.ride_id,
            match_id: r.match_id,
            driver_id: r.driver_id,
            passenger_id: r.passenger_id,
            status: r.status.to_string(),
            total_cost_minor_units: r.total_cost_minor_units,
        }
    }
}

/// `POST /internal/rides/{id}/confirm` — `StartRide`: PICKUP -> ONGOING.
pub async fn confirm(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideResponse>, ApiError> {
    let rides = RideRepository::new(state.pool.clone());
    let updated = rides.apply_transition(ride_id, RideEvent::DriverStarts).await?.into_domain();

    state
        .bus
        .publish(&Event::RideStarted(RideStarted { ride_id: updated.ride_id }))
        .await?;

    Ok(Json(updated.into()))
}

#[derive(Debug, Deserialize)]
pub struct ArriveBody {
    pub adjustment_factor: f64,
}

#[derive(Debug, Serialize)]
pub struct PaymentRequestResponse {
    #[serde(rename = "rideId")]
    pub ride_id: Uuid,
    #[serde(rename = "adjustedCost")]
    pub adjusted_cost: i64,
    #[serde(rename = "adminFee")]
    pub admin_fee: i64,
    #[serde(rename = "driverPayout")]
    pub driver_payout: i64,
    pub status: String,
}

/// `POST /internal/rides/{id}/arrive` — `RideArrived`: ONGOING -> COMPLETED
/// under a ride-row lock, then settlement math over the ledger sum (spec
/// §4.2 "Arrival & settlement").
pub async fn arrive(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(ride_id): Path<Uuid>,
    Json(body): Json<ArriveBody>,
) -> Result<Json<PaymentRequestResponse>, ApiError> {
    validate_adjustment_factor(body.adjustment_factor).map_err(|e| ApiError::Validation(e.to_string()))?;

    let rides = RideRepository::new(state.pool.clone());
    rides.apply_transition(ride_id, RideEvent::Arrived).await?;

    state
        .bus
        .publish(&Event::RideArrived(RideArrived { ride_id }))
        .await?;

    let ledger = BillingLedgerRepository::new(state.pool.clone());
    let total_cost = ledger.sum_cost_for_ride(ride_id).await?;

    let settlement = settle(total_cost, body.adjustment_factor, state.config.billing.admin_fee_percent);

    let payments = PaymentRepository::new(state.pool.clone());
    let payment = payments
        .create_pending(ride_id, settlement.adjusted_cost, settlement.admin_fee, settlement.driver_payout)
        .await?;

    Ok(Json(PaymentRequestResponse {
        ride_id,
        adjusted_cost: payment.adjusted_cost,
        admin_fee: payment.admin_fee,
        driver_payout: payment.driver_payout,
        status: payment.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PaymentDecisionBody {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    #[serde(rename = "paymentId")]
    pub payment_id: Uuid,
    #[serde(rename = "rideId")]
    pub ride_id: Uuid,
    #[serde(rename = "adjustedCost")]
    pub adjusted_cost: i64,
    #[serde(rename = "adminFee")]
    pub admin_fee: i64,
    #[serde(rename = "driverPayout")]
    pub driver_payout: i64,
    pub status: String,
}

/// `POST /internal/rides/{id}/payment` — `ProcessPayment`: ACCEPTED
/// finalizes as PROCESSED and publishes `ride.completed` exactly once
/// (idempotency key = ride_id); REJECTED leaves the ride COMPLETED with no
/// further event (spec §4.2).
pub async fn payment(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(ride_id): Path<Uuid>,
    Json(body): Json<PaymentDecisionBody>,
) -> Result<Json<PaymentResponse>, ApiError> {
    let decision: PaymentStatus = body
        .status
        .to_uppercase()
        .parse()
        .map_err(ApiError::Validation)?;

    if !matches!(decision, PaymentStatus::Accepted | PaymentStatus::Rejected) {
        return Err(ApiError::Validation(format!("unrecognized payment decision: {}", body.status)));
    }

    // A caller retrying this POST (e.g. after a timed-out response) must
    // not re-publish `ride.completed` or re-derive the settlement a second
    // time (spec §4.2 "idempotency key = ride_id", §9 "Idempotency key
    // tracking"). `payments.process` already no-ops past the first
    // transition, but the cached response lets a retry get back the exact
    // body the first call produced instead of today's (identical) state.
    let idempotency = IdempotencyKeyRepository::new(state.pool.clone());
    let key_hash = sha256_hex(&format!("rides:payment:{ride_id}:{decision}"));
    if let Some(cached) = idempotency.find_by_hash(&key_hash).await? {
        let response: PaymentResponse = serde_json::from_value(cached.response_body)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(Json(response));
    }

    let payments = PaymentRepository::new(state.pool.clone());
    let (entity, applied) = payments.process(ride_id, decision).await?;

    if applied && decision == PaymentStatus::Accepted {
        let rides = RideRepository::new(state.pool.clone());
        let ride = rides
            .find_by_id(ride_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("ride not found".to_string()))?;

        state
            .bus
            .publish(&Event::RideCompleted(RideCompleted {
                ride_id,
                total_cost_minor_units: ride.total_cost_minor_units,
            }))
            .await?;
    }

    let response = PaymentResponse {
        payment_id: entity.payment_id,
        ride_id: entity.ride_id,
        adjusted_cost: entity.adjusted_cost,
        admin_fee: entity.admin_fee,
        driver_payout: entity.driver_payout,
        status: entity.status,
    };

    if let Ok(body) = serde_json::to_value(&response) {
        let _ = idempotency.store(&key_hash, ride_id, body, 200).await;
    }

    Ok(Json(response))
}
