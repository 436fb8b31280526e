//! Dashboard summary domain models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::complaint::{Category, Complaint, ComplaintStatus, Urgency};
use crate::services::lifecycle::needs_escalation;

/// Complaint counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StatusBreakdown {
    pub pending_review: usize,
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
    pub rejected: usize,
}

/// Quick stats over the complaints visible to one actor.
///
/// `mine` and `upvoted_by_me` back the student dashboard,
/// `awaiting_confirmation` the committee's verification queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DashboardSummary {
    pub total: usize,
    pub by_status: StatusBreakdown,
    /// Past their deadline and not yet resolved or rejected.
    pub overdue: usize,
    /// Resolved complaints whose confirmation quorum has been reached.
    pub confirmed: usize,
    /// Resolved complaints still short of the quorum.
    pub awaiting_confirmation: usize,
    pub mine: usize,
    pub upvoted_by_me: usize,
    pub high_urgency: usize,
    pub flagged: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSummary {
    pub fn from_complaints<'a>(
        complaints: impl IntoIterator<Item = &'a Complaint>,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let mut summary = DashboardSummary {
            generated_at: now,
            ..Default::default()
        };

        for complaint in complaints {
            summary.total += 1;
            match complaint.status {
                ComplaintStatus::PendingReview => summary.by_status.pending_review += 1,
                ComplaintStatus::Open => summary.by_status.open += 1,
                ComplaintStatus::InProgress => summary.by_status.in_progress += 1,
                ComplaintStatus::Resolved => summary.by_status.resolved += 1,
                ComplaintStatus::Rejected => summary.by_status.rejected += 1,
            }
            if needs_escalation(complaint, now) {
                summary.overdue += 1;
            }
            if complaint.quorum_reached() {
                summary.confirmed += 1;
            } else if complaint.status == ComplaintStatus::Resolved {
                summary.awaiting_confirmation += 1;
            }
            if complaint.is_submitted_by(actor_id) {
                summary.mine += 1;
            }
            if complaint.has_upvoted(actor_id) {
                summary.upvoted_by_me += 1;
            }
            if complaint.urgency == Some(Urgency::High) {
                summary.high_urgency += 1;
            }
            if complaint.flagged {
                summary.flagged += 1;
            }
            *summary.by_category.entry(complaint.category).or_insert(0) += 1;
        }

        summary
    }
}
