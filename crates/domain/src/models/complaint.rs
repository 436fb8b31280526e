//! Complaint domain model.
//!
//! A complaint moves through `pending-review → open → in-progress → resolved`,
//! may be rejected during triage, and may be reopened from `resolved` by a
//! student flag. Guarded transitions live in `services::lifecycle`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Distinct confirmations needed before a resolution counts as confirmed.
pub const CONFIRMATION_QUORUM: usize = 30;

/// Days granted by a high-urgency deadline and by each extension.
pub const DEADLINE_WINDOW_DAYS: i64 = 7;

/// Maximum number of deadline extensions.
pub const MAX_EXTENSIONS: u8 = 2;

/// Departments a complaint may be routed to.
pub const DEPARTMENTS: [&str; 13] = [
    "Computer Science",
    "Electronics & Communication",
    "Mechanical Engineering",
    "Civil Engineering",
    "Information Science",
    "Electrical Engineering",
    "Chemical Engineering",
    "Biotechnology",
    "Mathematics",
    "Physics",
    "Chemistry",
    "MBA",
    "Other",
];

/// Complaint category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    Infrastructure,
    #[serde(rename = "IT Services")]
    ItServices,
    Academics,
    Safety,
    Hostel,
    Canteen,
    Transport,
    General,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Infrastructure,
        Category::ItServices,
        Category::Academics,
        Category::Safety,
        Category::Hostel,
        Category::Canteen,
        Category::Transport,
        Category::General,
    ];

    /// Categories routed to a specific department.
    pub fn requires_department(self) -> bool {
        matches!(self, Category::Infrastructure | Category::Academics)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Infrastructure => "Infrastructure",
            Category::ItServices => "IT Services",
            Category::Academics => "Academics",
            Category::Safety => "Safety",
            Category::Hostel => "Hostel",
            Category::Canteen => "Canteen",
            Category::Transport => "Transport",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// Who can see a complaint. Fixed at creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Lifecycle status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    PendingReview,
    Open,
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    /// Status-level guard for each transition.
    ///
    /// Field-level preconditions (urgency already assigned, missing deadline,
    /// confirmation quorum) are checked by the transition itself.
    pub fn permits(self, action: Action) -> bool {
        use ComplaintStatus::*;
        match action {
            Action::Submit => false,
            Action::AssignUrgency => matches!(self, PendingReview | Open | InProgress),
            Action::Reject => matches!(self, PendingReview | Open),
            Action::Respond => self == Open,
            Action::Resolve => self == InProgress,
            Action::ExtendDeadline => !matches!(self, Resolved | Rejected),
            Action::Upvote => self != Rejected,
            Action::Confirm | Action::Flag => self == Resolved,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ComplaintStatus::Rejected
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplaintStatus::PendingReview => write!(f, "pending-review"),
            ComplaintStatus::Open => write!(f, "open"),
            ComplaintStatus::InProgress => write!(f, "in-progress"),
            ComplaintStatus::Resolved => write!(f, "resolved"),
            ComplaintStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ComplaintStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending-review" => Ok(ComplaintStatus::PendingReview),
            "open" => Ok(ComplaintStatus::Open),
            "in-progress" => Ok(ComplaintStatus::InProgress),
            "resolved" => Ok(ComplaintStatus::Resolved),
            "rejected" => Ok(ComplaintStatus::Rejected),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// Committee-assigned severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "low"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(format!("unknown urgency: {}", other)),
        }
    }
}

/// Operations that act on a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Submit,
    AssignUrgency,
    Reject,
    Respond,
    Resolve,
    ExtendDeadline,
    Upvote,
    Confirm,
    Flag,
}

impl Action {
    /// Verb phrase for messages, e.g. "Cannot respond to a complaint".
    pub fn verb(self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::AssignUrgency => "assign urgency to",
            Action::Reject => "reject",
            Action::Respond => "respond to",
            Action::Resolve => "resolve",
            Action::ExtendDeadline => "extend the deadline of",
            Action::Upvote => "upvote",
            Action::Confirm => "confirm",
            Action::Flag => "flag",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Submit => write!(f, "submit"),
            Action::AssignUrgency => write!(f, "assign_urgency"),
            Action::Reject => write!(f, "reject"),
            Action::Respond => write!(f, "respond"),
            Action::Resolve => write!(f, "resolve"),
            Action::ExtendDeadline => write!(f, "extend_deadline"),
            Action::Upvote => write!(f, "upvote"),
            Action::Confirm => write!(f, "confirm"),
            Action::Flag => write!(f, "flag"),
        }
    }
}

/// Display progression shown on the complaint timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Submitted,
    Reviewed,
    InProgress,
    Resolved,
    Confirmed,
    /// Terminal display for rejected complaints; not part of the numbered
    /// progression.
    Rejected,
}

/// The complaint record.
///
/// Upvote and confirmation counts are derived from the actor sets, so a
/// count can never drift from its set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub department: Option<String>,
    pub location: Option<String>,
    pub visibility: Visibility,
    pub status: ComplaintStatus,
    pub urgency: Option<Urgency>,
    pub upvoted_by: BTreeSet<String>,
    pub confirmed_by: BTreeSet<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub extensions: u8,
    pub admin_response: Option<String>,
    pub image: Option<String>,
    pub proof_image: Option<String>,
    pub flagged: bool,
    /// Recorded for ownership checks; never exposed to other students.
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Complaint {
    pub fn upvotes(&self) -> usize {
        self.upvoted_by.len()
    }

    pub fn confirmations(&self) -> usize {
        self.confirmed_by.len()
    }

    pub fn has_upvoted(&self, actor_id: &str) -> bool {
        self.upvoted_by.contains(actor_id)
    }

    pub fn has_confirmed(&self, actor_id: &str) -> bool {
        self.confirmed_by.contains(actor_id)
    }

    pub fn is_submitted_by(&self, actor_id: &str) -> bool {
        self.submitted_by == actor_id
    }

    /// Resolved and confirmed by at least `CONFIRMATION_QUORUM` students.
    pub fn quorum_reached(&self) -> bool {
        self.status == ComplaintStatus::Resolved && self.confirmations() >= CONFIRMATION_QUORUM
    }
}

/// Draft submitted by a student.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewComplaint {
    #[validate(length(min = 1, max = 100, message = "Title must be between 1 and 100 characters"))]
    pub title: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "Description must be between 1 and 500 characters"
    ))]
    pub description: String,
    #[validate(required(message = "Category is required"))]
    pub category: Option<Category>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// Blob reference of an attached image.
    #[serde(default)]
    pub image: Option<String>,
}
