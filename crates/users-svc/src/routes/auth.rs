//! OTP-based authentication (spec §4.5 "RequestOtp"/"VerifyOtp"): the only
//! login path this system has — there is no password, matching spec §1's
//! scope (OTP + role upgrade, nothing else).

use axum::{extract::State, Json};
use persistence::repositories::user::{NewUser, UserRepository};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpBody {
    #[validate(length(min = 8, max = 20, message = "msisdn must be a valid E.164 number"))]
    pub msisdn: String,
}

#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub sent: bool,
}

pub async fn request_otp(
    State(state): State<AppState>,
    Json(body): Json<RequestOtpBody>,
) -> Result<Json<RequestOtpResponse>, ApiError> {
    body.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    state
        .otp
        .request(&body.msisdn)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;

    Ok(Json(RequestOtpResponse { sent: true }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpBody {
    #[validate(length(min = 8, max = 20))]
    pub msisdn: String,
    #[validate(length(equal = 6, message = "otp code must be 6 digits"))]
    pub code: String,
    #[validate(length(min = 1, max = 120))]
    pub fullname: String,
    /// Defaults to passenger (spec §3): a user only becomes a driver
    /// through the explicit role-upgrade endpoint.
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "passenger".to_string()
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub user_id: String,
    pub access_token: String,
    pub refresh_token: String,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(body): Json<VerifyOtpBody>,
) -> Result<Json<VerifyOtpResponse>, ApiError> {
    body.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

    let role: domain::models::Role = body
        .role
        .parse()
        .map_err(|e: String| ApiError::Validation(e))?;

    let verified = state
        .otp
        .verify(&body.msisdn, &body.code)
        .await
        .map_err(|e| ApiError::ServiceUnavailable(e.to_string()))?;
    if !verified {
        return Err(ApiError::Unauthorized("invalid or expired otp code".to_string()));
    }

    let user_repo = UserRepository::new(state.pool.clone());
    let user = user_repo
        .find_or_create(NewUser {
            msisdn: body.msisdn.clone(),
            fullname: body.fullname.clone(),
            role: role.as_str().to_string(),
        })
        .await?;

    let (access_token, _) = state
        .jwt_config
        .generate_access_token_with_identity(user.id, &user.role, &user.msisdn)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let (refresh_token, _) = state
        .jwt_config
        .generate_refresh_token(user.id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(VerifyOtpResponse {
        user_id: user.id.to_string(),
        access_token,
        refresh_token,
    }))
}
