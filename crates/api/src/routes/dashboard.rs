//! Dashboard route.

use axum::{extract::State, Json};
use domain::models::DashboardSummary;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ActorAuth;

/// Quick stats over the complaints the caller can see.
///
/// GET /api/v1/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = state.engine.dashboard_summary(&actor).await?;
    Ok(Json(summary))
}
