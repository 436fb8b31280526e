//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::models::{Action, ComplaintStatus, Role};

/// Failure reported by a complaint or blob store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Complaint already exists: {0}")]
    Duplicate(Uuid),
}

/// Errors returned by lifecycle operations.
///
/// A failed operation never leaves a partial change behind.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Cannot {} a complaint that is {status}: {detail}", .action.verb())]
    InvalidTransition {
        action: Action,
        status: ComplaintStatus,
        detail: &'static str,
    },

    #[error("Role {role} may not {} complaints", .action.verb())]
    Unauthorized { role: Role, action: Action },

    #[error("Deadline already extended {0} times")]
    ExtensionLimitExceeded(u8),

    #[error("Complaint not found: {0}")]
    NotFound(Uuid),

    #[error("Private complaints cannot be upvoted")]
    PrivateComplaint,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LifecycleError {
    pub(crate) fn transition(
        action: Action,
        status: ComplaintStatus,
        detail: &'static str,
    ) -> Self {
        LifecycleError::InvalidTransition {
            action,
            status,
            detail,
        }
    }
}

impl From<validator::ValidationErrors> for LifecycleError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field))
                })
            })
            .collect();
        messages.sort();
        LifecycleError::Validation(messages.join("; "))
    }
}
