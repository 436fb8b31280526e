//! Blob upload routes for complaint images and resolution proofs.
//!
//! The body is the raw file. The returned reference is what clients pass as
//! `image` on submission or `proof_image` on resolution.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::validation::validate_blob_reference;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorAuth;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub reference: String,
    pub size: usize,
}

/// POST /api/v1/uploads?name=<file>
pub async fn upload_blob(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    if body.is_empty() {
        return Err(ApiError::Validation("Upload body is empty".to_string()));
    }
    if body.len() > state.config.uploads.max_bytes {
        return Err(ApiError::PayloadTooLarge(format!(
            "Uploads are limited to {} bytes",
            state.config.uploads.max_bytes
        )));
    }

    let name = query.name.as_deref().unwrap_or("upload");
    let reference = state.blobs.upload(&body, name).await?;

    info!(
        actor_id = %actor.id,
        reference = %reference,
        size = body.len(),
        "Blob uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            reference,
            size: body.len(),
        }),
    ))
}

/// GET /api/v1/uploads/:reference
pub async fn fetch_blob(
    State(state): State<AppState>,
    ActorAuth(_actor): ActorAuth,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_blob_reference(&reference)
        .map_err(|_| ApiError::Validation("Invalid blob reference".to_string()))?;

    let bytes = state
        .blobs
        .fetch(&reference)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blob not found: {}", reference)))?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        bytes,
    ))
}
