//! Guarded complaint transitions.
//!
//! Every function here validates first and only then mutates, so an `Err`
//! leaves the complaint untouched. Time is passed in by the caller and read
//! once per operation.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::errors::LifecycleError;
use crate::models::{
    Action, Complaint, ComplaintStatus, NewComplaint, Stage, Urgency, Visibility,
    CONFIRMATION_QUORUM, DEADLINE_WINDOW_DAYS, DEPARTMENTS, MAX_EXTENSIONS,
};

fn deadline_from(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(DEADLINE_WINDOW_DAYS)
}

fn ensure_permitted(
    complaint: &Complaint,
    action: Action,
    detail: &'static str,
) -> Result<(), LifecycleError> {
    if complaint.status.permits(action) {
        Ok(())
    } else {
        Err(LifecycleError::transition(action, complaint.status, detail))
    }
}

/// Builds a fresh `pending-review` complaint from a student's draft.
pub fn new_complaint(
    draft: NewComplaint,
    submitted_by: &str,
    id: Uuid,
    now: DateTime<Utc>,
) -> Result<Complaint, LifecycleError> {
    let draft = NewComplaint {
        title: shared::validation::normalize_text(&draft.title),
        description: shared::validation::normalize_text(&draft.description),
        department: shared::validation::normalize_optional_text(draft.department),
        location: shared::validation::normalize_optional_text(draft.location),
        image: shared::validation::normalize_optional_text(draft.image),
        ..draft
    };
    draft.validate()?;

    let category = draft
        .category
        .ok_or_else(|| LifecycleError::Validation("Category is required".into()))?;

    let department = if category.requires_department() {
        match draft.department {
            Some(dept) if DEPARTMENTS.contains(&dept.as_str()) => Some(dept),
            Some(dept) => {
                return Err(LifecycleError::Validation(format!(
                    "Unknown department: {}",
                    dept
                )))
            }
            None => {
                return Err(LifecycleError::Validation(format!(
                    "Department is required for {} complaints",
                    category
                )))
            }
        }
    } else {
        None
    };

    if let Some(image) = &draft.image {
        shared::validation::validate_blob_reference(image)
            .map_err(|_| LifecycleError::Validation("Invalid image reference".into()))?;
    }

    Ok(Complaint {
        id,
        title: draft.title,
        description: draft.description,
        category,
        department,
        location: draft.location,
        visibility: draft.visibility,
        status: ComplaintStatus::PendingReview,
        urgency: None,
        upvoted_by: BTreeSet::new(),
        confirmed_by: BTreeSet::new(),
        deadline: None,
        extensions: 0,
        admin_response: None,
        image: draft.image,
        proof_image: None,
        flagged: false,
        submitted_by: submitted_by.to_string(),
        created_at: now,
        updated_at: now,
        resolved_at: None,
    })
}

/// Committee triage. Urgency is assigned once; `high` starts a deadline.
pub fn assign_urgency(
    complaint: &mut Complaint,
    urgency: Urgency,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::AssignUrgency,
        "urgency can only be assigned during triage",
    )?;
    if complaint.urgency.is_some() {
        return Err(LifecycleError::transition(
            Action::AssignUrgency,
            complaint.status,
            "urgency has already been assigned",
        ));
    }

    complaint.urgency = Some(urgency);
    if urgency == Urgency::High {
        complaint.deadline = Some(deadline_from(now));
    }
    if complaint.status == ComplaintStatus::PendingReview {
        complaint.status = ComplaintStatus::Open;
    }
    complaint.updated_at = now;
    Ok(())
}

pub fn reject(
    complaint: &mut Complaint,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Reject,
        "only pending or open complaints can be rejected",
    )?;
    shared::validation::validate_not_blank(reason)
        .map_err(|_| LifecycleError::Validation("A rejection reason is required".into()))?;
    let reason = reason.trim();

    complaint.status = ComplaintStatus::Rejected;
    complaint.admin_response = Some(reason.to_string());
    complaint.updated_at = now;
    Ok(())
}

/// Moves an open complaint into progress. Without a message the previous
/// response text is kept.
pub fn respond(
    complaint: &mut Complaint,
    message: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Respond,
        "only open complaints can be responded to",
    )?;

    complaint.status = ComplaintStatus::InProgress;
    if let Some(message) = shared::validation::normalize_optional_text(message) {
        complaint.admin_response = Some(message);
    }
    complaint.updated_at = now;
    Ok(())
}

/// Resolves an in-progress complaint and restarts the confirmation quorum.
pub fn resolve(
    complaint: &mut Complaint,
    summary: Option<String>,
    proof: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Resolve,
        "only in-progress complaints can be resolved",
    )?;
    let proof = shared::validation::normalize_optional_text(proof);
    if let Some(proof) = &proof {
        shared::validation::validate_blob_reference(proof)
            .map_err(|_| LifecycleError::Validation("Invalid proof image reference".into()))?;
    }

    complaint.status = ComplaintStatus::Resolved;
    complaint.resolved_at = Some(now);
    if let Some(summary) = shared::validation::normalize_optional_text(summary) {
        complaint.admin_response = Some(summary);
    }
    complaint.proof_image = proof;
    complaint.confirmed_by.clear();
    complaint.updated_at = now;
    Ok(())
}

/// Restarts the deadline countdown from `now`.
pub fn extend_deadline(
    complaint: &mut Complaint,
    now: DateTime<Utc>,
) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::ExtendDeadline,
        "closed complaints have no deadline to extend",
    )?;
    if complaint.deadline.is_none() {
        return Err(LifecycleError::transition(
            Action::ExtendDeadline,
            complaint.status,
            "complaint has no deadline",
        ));
    }
    if complaint.extensions >= MAX_EXTENSIONS {
        return Err(LifecycleError::ExtensionLimitExceeded(complaint.extensions));
    }

    complaint.deadline = Some(deadline_from(now));
    complaint.extensions += 1;
    complaint.updated_at = now;
    Ok(())
}

/// Adds or removes the actor's upvote. Returns whether the actor now upvotes.
pub fn toggle_upvote(
    complaint: &mut Complaint,
    actor_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Upvote,
        "rejected complaints cannot be upvoted",
    )?;
    if complaint.visibility == Visibility::Private {
        return Err(LifecycleError::PrivateComplaint);
    }

    let upvoted = if complaint.upvoted_by.remove(actor_id) {
        false
    } else {
        complaint.upvoted_by.insert(actor_id.to_string());
        true
    };
    complaint.updated_at = now;
    Ok(upvoted)
}

/// Records a confirmation. Returns `false` when the actor had already
/// confirmed, in which case nothing changes.
pub fn confirm_resolution(
    complaint: &mut Complaint,
    actor_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Confirm,
        "only resolved complaints can be confirmed",
    )?;
    if complaint.has_confirmed(actor_id) {
        return Ok(false);
    }

    complaint.confirmed_by.insert(actor_id.to_string());
    complaint.updated_at = now;
    Ok(true)
}

/// Reopens a resolved complaint whose resolution has not been confirmed.
///
/// Urgency, deadline, extensions and confirmations are carried over as they
/// are.
pub fn flag(complaint: &mut Complaint, now: DateTime<Utc>) -> Result<(), LifecycleError> {
    ensure_permitted(
        complaint,
        Action::Flag,
        "only resolved complaints can be flagged",
    )?;
    if complaint.quorum_reached() {
        return Err(LifecycleError::transition(
            Action::Flag,
            complaint.status,
            "resolution already confirmed by quorum",
        ));
    }

    complaint.flagged = true;
    complaint.status = ComplaintStatus::Open;
    complaint.updated_at = now;
    Ok(())
}

/// Deadline set, not resolved, and already past.
pub fn is_overdue(complaint: &Complaint, now: DateTime<Utc>) -> bool {
    match complaint.deadline {
        Some(deadline) => complaint.status != ComplaintStatus::Resolved && deadline < now,
        None => false,
    }
}

/// Overdue and still actionable. Rejected complaints keep their deadline
/// but are never escalated or counted as overdue.
pub fn needs_escalation(complaint: &Complaint, now: DateTime<Utc>) -> bool {
    is_overdue(complaint, now) && !complaint.status.is_terminal()
}

/// Whole days until the deadline, rounded up. Zero or negative once the
/// deadline has passed.
pub fn days_remaining(complaint: &Complaint, now: DateTime<Utc>) -> Option<i64> {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    complaint.deadline.map(|deadline| {
        let ms = (deadline - now).num_milliseconds();
        -(-ms).div_euclid(DAY_MS)
    })
}

/// Timeline stage shown for a complaint.
pub fn compute_active_stage(complaint: &Complaint) -> Stage {
    match complaint.status {
        ComplaintStatus::PendingReview => Stage::Submitted,
        ComplaintStatus::Open => Stage::Reviewed,
        ComplaintStatus::InProgress => Stage::InProgress,
        ComplaintStatus::Resolved if complaint.confirmations() >= CONFIRMATION_QUORUM => {
            Stage::Confirmed
        }
        ComplaintStatus::Resolved => Stage::Resolved,
        ComplaintStatus::Rejected => Stage::Rejected,
    }
}
