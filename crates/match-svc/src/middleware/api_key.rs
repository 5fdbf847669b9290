//! Internal service-to-service authentication (spec §6 "service-internal,
//! API-key authenticated with header `X-API-Key`").

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;

/// The calling service's name, resolved from its presented key.
#[derive(Debug, Clone)]
pub struct ApiKeyAuth {
    pub service: String,
}

#[async_trait]
impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get("X-API-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("missing X-API-Key header".to_string()))?;

        state
            .config
            .api_keys
            .iter()
            .find(|(_, key)| key.as_str() == presented)
            .map(|(service, _)| ApiKeyAuth { service: service.clone() })
            .ok_or_else(|| ApiError::Unauthorized("invalid api key".to_string()))
    }
}
