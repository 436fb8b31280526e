//! Actor authentication extractor.
//!
//! Verifies the identity provider's Bearer token and yields the calling
//! [`Actor`]. Capability checks stay in the engine.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{Actor, Role};
use shared::jwt::TokenVerifier;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct ActorAuth(pub Actor);

impl ActorAuth {
    /// Verifies a raw `Authorization` header value.
    pub fn from_header(verifier: &TokenVerifier, header: Option<&str>) -> Result<Self, ApiError> {
        let header = header
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = verifier.verify(token.trim())?;
        let role: Role = claims.role.parse().map_err(|e: String| {
            tracing::debug!(actor_id = %claims.sub, error = %e, "Token carries unknown role");
            ApiError::Unauthorized("Token carries an unknown role".to_string())
        })?;

        Ok(ActorAuth(Actor::new(claims.sub, role)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for ActorAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        Self::from_header(&state.verifier, header)
    }
}
