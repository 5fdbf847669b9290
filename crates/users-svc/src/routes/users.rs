//! Authenticated user routes: profile lookup and the passenger -> driver
//! role upgrade (spec §4.5, SPEC_FULL.md "additive role upgrade").

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use persistence::repositories::user::UserRepository;
use serde::{Deserialize, Serialize};
use shared::jwt::Claims;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

/// Validates the `Authorization: Bearer <token>` header and attaches the
/// decoded claims to the request for downstream handlers (teacher's
/// `require_auth` shape, generalized from API keys to JWT bearer tokens).
pub async fn require_jwt(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let claims = state
        .jwt_config
        .validate_access_token(token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn claims_user_id(claims: &Claims) -> Result<Uuid, ApiError> {
    claims
        .sub
        .parse()
        .map_err(|_| ApiError::Unauthorized("malformed token subject".to_string()))
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub msisdn: String,
    pub fullname: String,
    pub role: String,
    pub rating: f64,
}

pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = claims_user_id(&claims)?;
    let repo = UserRepository::new(state.pool.clone());
    let user = repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".to_string()))?;

    Ok(Json(UserResponse {
        id: user.id.to_string(),
        msisdn: user.msisdn,
        fullname: user.fullname,
        role: user.role,
        rating: user.rating,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpgradeToDriverBody {
    #[validate(length(min = 1, max = 40))]
    pub vehicle_type: String,
    #[validate(length(min = 1, max = 20))]
    pub vehicle_plate: String,
}

#[derive(Debug, Serialize)]
pub struct UpgradeToDriverResponse {
    pub user_id: String,
    pub role: String,
}

pub async fn upgrade_to_driver(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<UpgradeToDriverBody>,
) -> Result<Json<UpgradeToDriverResponse>, ApiError> {
    body.validate().map_err(|e| ApiError::Validation(e.to_string()))?;
    let user_id = claims_user_id(&claims)?;

    let repo = UserRepository::new(state.pool.clone());
    repo.upgrade_to_driver(user_id, &body.vehicle_type, &body.vehicle_plate)
        .await?;

    Ok(Json(UpgradeToDriverResponse {
        user_id: user_id.to_string(),
        role: "driver".to_string(),
    }))
}
