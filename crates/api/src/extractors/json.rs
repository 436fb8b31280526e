//! JSON body extractors that report failures as [`ApiError`].

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Required JSON body. Rejections render as `validation_error`.
pub type ValidJson<T> = axum_extra::extract::WithRejection<Json<T>, ApiError>;

/// JSON body that may be left out entirely.
///
/// An empty body yields `None`; a body that is present must parse.
#[derive(Debug, Clone)]
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(OptionalJson(None));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes)?;
        Ok(OptionalJson(Some(value)))
    }
}
