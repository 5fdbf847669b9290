//! Internal service-to-service authentication (spec §9 "config-driven
//! `api_keys{service -> key}`"): simplified from the teacher's DB-backed
//! `ApiKeyAuth` extractor to a static config lookup, since this cluster has
//! no API-key issuance/rotation surface of its own — keys are provisioned
//! out of band, one per calling service.

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
