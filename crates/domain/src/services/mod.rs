//! Domain services for CampusWatch.
//!
//! `lifecycle` holds the pure guarded transitions; `engine` composes them with
//! the storage, notification and clock collaborators.

pub mod clock;
pub mod engine;
pub mod lifecycle;
pub mod memory;
pub mod notification;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{ComplaintFeed, ComplaintLifecycleEngine};
pub use memory::InMemoryComplaintStore;
pub use notification::{
    HighUrgencyAlertPayload, LoggingNotificationService, MockNotificationService,
    NotificationPayload, NotificationResult, NotificationService, NotificationType,
    OverdueAlertPayload,
};
pub use store::{
    BlobStore, ChangeKind, ComplaintChange, ComplaintQuery, ComplaintStore, Mutation,
};
