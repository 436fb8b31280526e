//! Domain models for CampusWatch.

pub mod actor;
pub mod complaint;
pub mod dashboard;

pub use actor::{Actor, Role};
pub use complaint::{
    Action, Category, Complaint, ComplaintStatus, NewComplaint, Stage, Urgency, Visibility,
    CONFIRMATION_QUORUM, DEADLINE_WINDOW_DAYS, DEPARTMENTS, MAX_EXTENSIONS,
};
pub use dashboard::{DashboardSummary, StatusBreakdown};
