//! Complaint lifecycle routes.
//!
//! Thin adapters over [`ComplaintLifecycleEngine`](domain::services::ComplaintLifecycleEngine):
//! each handler authenticates the actor, delegates to one engine operation
//! and renders the result through [`ComplaintView`].

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use domain::models::{
    Action, Actor, Category, Complaint, ComplaintStatus, NewComplaint, Stage, Urgency, Visibility,
};
use domain::services::ComplaintQuery;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{ActorAuth, OptionalJson, ValidJson};
use crate::middleware::metrics::{record_complaint_submitted, record_complaint_transition};

const DEFAULT_PER_PAGE: u32 = 20;
const MAX_PER_PAGE: u32 = 100;

// ============================================================================
// Views
// ============================================================================

/// Complaint as rendered to a particular actor.
///
/// The submitter and the upvoter/confirmer sets stay server-side; the caller
/// only learns their own relationship to the complaint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ComplaintView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub visibility: Visibility,
    pub status: ComplaintStatus,
    pub urgency: Option<Urgency>,
    pub upvotes: usize,
    pub confirmations: usize,
    pub deadline: Option<DateTime<Utc>>,
    pub extensions: u8,
    pub admin_response: Option<String>,
    pub image: Option<String>,
    pub proof_image: Option<String>,
    pub flagged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub is_mine: bool,
    pub has_upvoted: bool,
    pub has_confirmed: bool,
    pub is_overdue: bool,
    /// Whole days until the deadline, rounded up; negative once overdue.
    pub days_remaining: Option<i64>,
    pub stage: Stage,
}

impl ComplaintView {
    fn render(state: &AppState, actor: &Actor, complaint: Complaint) -> Self {
        let is_overdue = state.engine.is_overdue(&complaint);
        let days_remaining = state.engine.days_remaining(&complaint);
        let stage = state.engine.stage(&complaint);

        Self {
            is_mine: complaint.is_submitted_by(&actor.id),
            has_upvoted: complaint.has_upvoted(&actor.id),
            has_confirmed: complaint.has_confirmed(&actor.id),
            upvotes: complaint.upvotes(),
            confirmations: complaint.confirmations(),
            is_overdue,
            days_remaining,
            stage,
            id: complaint.id,
            title: complaint.title,
            description: complaint.description,
            category: complaint.category,
            department: complaint.department,
            location: complaint.location,
            visibility: complaint.visibility,
            status: complaint.status,
            urgency: complaint.urgency,
            deadline: complaint.deadline,
            extensions: complaint.extensions,
            admin_response: complaint.admin_response,
            image: complaint.image,
            proof_image: complaint.proof_image,
            flagged: complaint.flagged,
            created_at: complaint.created_at,
            updated_at: complaint.updated_at,
            resolved_at: complaint.resolved_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComplaintListResponse {
    pub data: Vec<ComplaintView>,
    pub pagination: Pagination,
}

// ============================================================================
// Requests
// ============================================================================

/// Query parameters for `GET /api/v1/complaints`.
#[derive(Debug, Default, Deserialize)]
pub struct ListComplaintsQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub urgency: Option<String>,
    /// Only the caller's own complaints.
    #[serde(default)]
    pub mine: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListComplaintsQuery {
    fn into_query(self, actor: &Actor) -> Result<(ComplaintQuery, u32, u32), ApiError> {
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page == 0 {
            return Err(ApiError::Validation("page must be at least 1".to_string()));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(ApiError::Validation(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        let query = ComplaintQuery {
            status: self
                .status
                .map(|s| s.parse::<ComplaintStatus>())
                .transpose()
                .map_err(ApiError::Validation)?,
            category: self
                .category
                .map(|c| c.parse::<Category>())
                .transpose()
                .map_err(ApiError::Validation)?,
            urgency: self
                .urgency
                .map(|u| u.parse::<Urgency>())
                .transpose()
                .map_err(ApiError::Validation)?,
            submitted_by: self.mine.then(|| actor.id.clone()),
            limit: Some(per_page as usize),
            offset: ((page - 1) as usize) * per_page as usize,
            ..Default::default()
        };

        Ok((query, page, per_page))
    }
}

#[derive(Debug, Deserialize)]
pub struct AssignUrgencyRequest {
    pub urgency: Urgency,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RespondRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub proof_image: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a complaint.
///
/// POST /api/v1/complaints
pub async fn submit_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    WithRejection(Json(draft), _): ValidJson<NewComplaint>,
) -> Result<(StatusCode, Json<ComplaintView>), ApiError> {
    let complaint = state.engine.submit_complaint(&actor, draft).await?;
    record_complaint_submitted();

    Ok((
        StatusCode::CREATED,
        Json(ComplaintView::render(&state, &actor, complaint)),
    ))
}

/// List complaints visible to the caller, newest first.
///
/// GET /api/v1/complaints
pub async fn list_complaints(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Query(params): Query<ListComplaintsQuery>,
) -> Result<Json<ComplaintListResponse>, ApiError> {
    let (query, page, per_page) = params.into_query(&actor)?;

    let total = state.engine.count_complaints(&actor, &query.unpaged()).await?;
    let complaints = state.engine.list_complaints(&actor, &query).await?;
    let total_pages = total.div_ceil(per_page as u64) as u32;

    let data = complaints
        .into_iter()
        .map(|c| ComplaintView::render(&state, &actor, c))
        .collect();

    Ok(Json(ComplaintListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// GET /api/v1/complaints/:id
pub async fn get_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state.engine.get_complaint(&actor, id).await?;
    Ok(Json(ComplaintView::render(&state, &actor, complaint)))
}

fn transitioned(
    state: &AppState,
    actor: &Actor,
    action: Action,
    complaint: Complaint,
) -> Json<ComplaintView> {
    record_complaint_transition(action);
    Json(ComplaintView::render(state, actor, complaint))
}

/// POST /api/v1/complaints/:id/urgency
pub async fn assign_urgency(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): ValidJson<AssignUrgencyRequest>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state
        .engine
        .assign_urgency(&actor, id, request.urgency)
        .await?;
    Ok(transitioned(&state, &actor, Action::AssignUrgency, complaint))
}

/// POST /api/v1/complaints/:id/reject
pub async fn reject_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
    WithRejection(Json(request), _): ValidJson<RejectRequest>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state
        .engine
        .reject_complaint(&actor, id, &request.reason)
        .await?;
    Ok(transitioned(&state, &actor, Action::Reject, complaint))
}

/// POST /api/v1/complaints/:id/respond
///
/// Moves an open complaint into progress. The message is optional.
pub async fn respond_to_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<RespondRequest>,
) -> Result<Json<ComplaintView>, ApiError> {
    let request = request.unwrap_or_default();
    let complaint = state
        .engine
        .respond_to_complaint(&actor, id, request.message)
        .await?;
    Ok(transitioned(&state, &actor, Action::Respond, complaint))
}

/// POST /api/v1/complaints/:id/resolve
pub async fn resolve_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
    OptionalJson(request): OptionalJson<ResolveRequest>,
) -> Result<Json<ComplaintView>, ApiError> {
    let request = request.unwrap_or_default();
    let complaint = state
        .engine
        .resolve_complaint(&actor, id, request.summary, request.proof_image)
        .await?;
    Ok(transitioned(&state, &actor, Action::Resolve, complaint))
}

/// POST /api/v1/complaints/:id/extend
pub async fn extend_deadline(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state.engine.extend_deadline(&actor, id).await?;
    Ok(transitioned(&state, &actor, Action::ExtendDeadline, complaint))
}

/// POST /api/v1/complaints/:id/upvote
///
/// Toggles the caller's upvote.
pub async fn toggle_upvote(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state.engine.toggle_upvote(&actor, id).await?;
    Ok(transitioned(&state, &actor, Action::Upvote, complaint))
}

/// POST /api/v1/complaints/:id/confirm
pub async fn confirm_resolution(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state.engine.confirm_resolution(&actor, id).await?;
    Ok(transitioned(&state, &actor, Action::Confirm, complaint))
}

/// POST /api/v1/complaints/:id/flag
pub async fn flag_complaint(
    State(state): State<AppState>,
    ActorAuth(actor): ActorAuth,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintView>, ApiError> {
    let complaint = state.engine.flag_complaint(&actor, id).await?;
    Ok(transitioned(&state, &actor, Action::Flag, complaint))
}
