//! Storage collaborator contracts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::errors::{LifecycleError, StoreError};
use crate::models::{Category, Complaint, ComplaintStatus, Urgency, Visibility};

/// A guarded transition applied by the store under its per-complaint lock.
///
/// The store applies it to a copy of the current record and persists the copy
/// only on `Ok`.
pub type Mutation<'a> = dyn Fn(&mut Complaint) -> Result<(), LifecycleError> + Send + Sync + 'a;

/// Filters for listing complaints. Results are ordered by `created_at`
/// descending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintQuery {
    pub status: Option<ComplaintStatus>,
    pub category: Option<Category>,
    pub urgency: Option<Urgency>,
    pub submitted_by: Option<String>,
    /// Restrict to public complaints plus the private ones this actor filed.
    pub visible_to: Option<String>,
    /// Only complaints whose deadline passed before this instant and that are
    /// not resolved.
    pub overdue_at: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl ComplaintQuery {
    pub fn all() -> Self {
        Self::default()
    }

    /// Drops pagination, keeping the filters.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }

    pub fn matches(&self, complaint: &Complaint) -> bool {
        if self.status.is_some_and(|s| complaint.status != s) {
            return false;
        }
        if self.category.is_some_and(|c| complaint.category != c) {
            return false;
        }
        if self.urgency.is_some() && complaint.urgency != self.urgency {
            return false;
        }
        if let Some(submitter) = &self.submitted_by {
            if !complaint.is_submitted_by(submitter) {
                return false;
            }
        }
        if let Some(viewer) = &self.visible_to {
            if complaint.visibility == Visibility::Private && !complaint.is_submitted_by(viewer) {
                return false;
            }
        }
        if let Some(at) = self.overdue_at {
            if !crate::services::lifecycle::is_overdue(complaint, at) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
}

/// Emitted by a store after a complaint is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplaintChange {
    pub id: Uuid,
    pub kind: ChangeKind,
}

/// Durable keyed storage for complaints.
///
/// `update` must serialize mutations per complaint id; mutations on different
/// ids must not block each other.
#[async_trait::async_trait]
pub trait ComplaintStore: Send + Sync {
    async fn create(&self, complaint: &Complaint) -> Result<Uuid, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Complaint>, StoreError>;

    /// Applies `mutation` atomically and returns the committed record.
    async fn update(&self, id: Uuid, mutation: &Mutation<'_>) -> Result<Complaint, LifecycleError>;

    async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>, StoreError>;

    async fn count(&self, query: &ComplaintQuery) -> Result<u64, StoreError>;

    fn watch(&self) -> broadcast::Receiver<ComplaintChange>;
}

/// Storage for uploaded images and resolution proofs.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` and returns an opaque reference.
    async fn upload(&self, bytes: &[u8], name: &str) -> Result<String, StoreError>;

    async fn fetch(&self, reference: &str) -> Result<Option<Vec<u8>>, StoreError>;
}
