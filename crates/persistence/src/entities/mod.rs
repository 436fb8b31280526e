//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod complaint;

pub use complaint::{ComplaintEntity, ComplaintStatusDb, UrgencyDb, VisibilityDb};
