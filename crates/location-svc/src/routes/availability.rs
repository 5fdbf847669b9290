//! Service-internal availability-pool endpoints (spec §6): the HTTP face of
//! `AddAvailableDriver`/`AddAvailablePassenger`/`Remove…` (spec §4.1), plus
//! the nearby-candidates and last-known-location reads match-svc and other
//! callers use. Availability pool operations call into `crates/geo-index`,
//! not Postgres — location-svc holds no direct database connection.

use axum::extract::{Path, Query, State};
use axum::Json;
use domain::models::Role;
use serde::{Deserialize, Serialize};
use shared::geo::GeoPoint;
use shared::validation::{validate_latitude, validate_longitude};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::api_key::ApiKeyAuth;

#[derive(Debug, Deserialize)]
pub struct AvailableBody {
    pub lat: f64,
    pub lng: f64,
}

fn validate_point(lat: f64, lng: f64) -> Result<(), ApiError> {
    validate_latitude(lat).map_err(|e| ApiError::Validation(e.to_string()))?;
    validate_longitude(lng).map_err(|e| ApiError::Validation(e.to_string()))?;
    Ok(())
}

pub async fn add_driver(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(driver_id): Path<Uuid>,
    Json(body): Json<AvailableBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_point(body.lat, body.lng)?;
    state
        .geo
        .add_available(
            Role::Driver,
            driver_id,
            GeoPoint::new(body.lat, body.lng),
            state.config.location.availability_ttl_secs(),
        )
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub async fn remove_driver(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.geo.remove_available(Role::Driver, driver_id).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub async fn add_passenger(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(passenger_id): Path<Uuid>,
    Json(body): Json<AvailableBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_point(body.lat, body.lng)?;
    state
        .geo
        .add_available(
            Role::Passenger,
            passenger_id,
            GeoPoint::new(body.lat, body.lng),
            state.config.location.availability_ttl_secs(),
        )
        .await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

pub async fn remove_passenger(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.geo.remove_available(Role::Passenger, passenger_id).await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CandidateResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
}

pub async fn nearby_drivers(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<CandidateResponse>>, ApiError> {
    validate_point(query.lat, query.lng)?;
    let radius_km = query.radius.unwrap_or(state.config.location.default_nearby_radius_km);
    if radius_km <= 0.0 {
        return Err(ApiError::Validation("radius must be positive".to_string()));
    }

    let candidates = state
        .geo
        .nearby(Role::Driver, GeoPoint::new(query.lat, query.lng), radius_km)
        .await?;

    Ok(Json(
        candidates
            .into_iter()
            .map(|c| CandidateResponse {
                user_id: c.user_id,
                lat: c.location.lat,
                lng: c.location.lng,
                distance_km: c.distance_km,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct LastKnownLocationResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub ts: i64,
}

pub async fn driver_location(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<LastKnownLocationResponse>, ApiError> {
    let entry = state
        .geo
        .last_known_location(Role::Driver, driver_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no last known location for driver".to_string()))?;

    Ok(Json(LastKnownLocationResponse {
        user_id: entry.user_id,
        lat: entry.location.lat,
        lng: entry.location.lng,
        ts: entry.ts,
    }))
}

pub async fn passenger_location(
    State(state): State<AppState>,
    _auth: ApiKeyAuth,
    Path(passenger_id): Path<Uuid>,
) -> Result<Json<LastKnownLocationResponse>, ApiError> {
    let entry = state
        .geo
        .last_known_location(Role::Passenger, passenger_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no last known location for passenger".to_string()))?;

    Ok(Json(LastKnownLocationResponse {
        user_id: entry.user_id,
        lat: entry.location.lat,
        lng: entry.location.lng,
        ts: entry.ts,
    }))
}
