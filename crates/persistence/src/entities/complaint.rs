//! Complaint entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::errors::StoreError;
use domain::models::{Complaint, ComplaintStatus, Urgency, Visibility};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for complaint status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "complaint_status", rename_all = "kebab-case")]
pub enum ComplaintStatusDb {
    PendingReview,
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl From<ComplaintStatusDb> for ComplaintStatus {
    fn from(db: ComplaintStatusDb) -> Self {
        match db {
            ComplaintStatusDb::PendingReview => ComplaintStatus::PendingReview,
            ComplaintStatusDb::Open => ComplaintStatus::Open,
            ComplaintStatusDb::InProgress => ComplaintStatus::InProgress,
            ComplaintStatusDb::Resolved => ComplaintStatus::Resolved,
            ComplaintStatusDb::Rejected => ComplaintStatus::Rejected,
        }
    }
}

impl From<ComplaintStatus> for ComplaintStatusDb {
    fn from(status: ComplaintStatus) -> Self {
        match status {
            ComplaintStatus::PendingReview => ComplaintStatusDb::PendingReview,
            ComplaintStatus::Open => ComplaintStatusDb::Open,
            ComplaintStatus::InProgress => ComplaintStatusDb::InProgress,
            ComplaintStatus::Resolved => ComplaintStatusDb::Resolved,
            ComplaintStatus::Rejected => ComplaintStatusDb::Rejected,
        }
    }
}

/// Database enum for complaint urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "complaint_urgency", rename_all = "lowercase")]
pub enum UrgencyDb {
    Low,
    Medium,
    High,
}

impl From<UrgencyDb> for Urgency {
    fn from(db: UrgencyDb) -> Self {
        match db {
            UrgencyDb::Low => Urgency::Low,
            UrgencyDb::Medium => Urgency::Medium,
            UrgencyDb::High => Urgency::High,
        }
    }
}

impl From<Urgency> for UrgencyDb {
    fn from(urgency: Urgency) -> Self {
        match urgency {
            Urgency::Low => UrgencyDb::Low,
            Urgency::Medium => UrgencyDb::Medium,
            Urgency::High => UrgencyDb::High,
        }
    }
}

/// Database enum for complaint visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "complaint_visibility", rename_all = "lowercase")]
pub enum VisibilityDb {
    Public,
    Private,
}

impl From<VisibilityDb> for Visibility {
    fn from(db: VisibilityDb) -> Self {
        match db {
            VisibilityDb::Public => Visibility::Public,
            VisibilityDb::Private => Visibility::Private,
        }
    }
}

impl From<Visibility> for VisibilityDb {
    fn from(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => VisibilityDb::Public,
            Visibility::Private => VisibilityDb::Private,
        }
    }
}

/// Database row mapping for the complaints table.
#[derive(Debug, Clone, FromRow)]
pub struct ComplaintEntity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub visibility: VisibilityDb,
    pub status: ComplaintStatusDb,
    pub urgency: Option<UrgencyDb>,
    pub upvoted_by: Vec<String>,
    pub upvotes: i32,
    pub confirmed_by: Vec<String>,
    pub confirmations: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub extensions: i16,
    pub admin_response: Option<String>,
    pub image: Option<String>,
    pub proof_image: Option<String>,
    pub flagged: bool,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<ComplaintEntity> for Complaint {
    type Error = StoreError;

    fn try_from(entity: ComplaintEntity) -> Result<Self, Self::Error> {
        let category = entity.category.parse().map_err(StoreError::Backend)?;
        let extensions = u8::try_from(entity.extensions).map_err(|_| {
            StoreError::Backend(format!(
                "complaint {} has invalid extensions {}",
                entity.id, entity.extensions
            ))
        })?;

        Ok(Complaint {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            category,
            department: entity.department,
            location: entity.location,
            visibility: entity.visibility.into(),
            status: entity.status.into(),
            urgency: entity.urgency.map(Into::into),
            upvoted_by: entity.upvoted_by.into_iter().collect(),
            confirmed_by: entity.confirmed_by.into_iter().collect(),
            deadline: entity.deadline,
            extensions,
            admin_response: entity.admin_response,
            image: entity.image,
            proof_image: entity.proof_image,
            flagged: entity.flagged,
            submitted_by: entity.submitted_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
            resolved_at: entity.resolved_at,
        })
    }
}
