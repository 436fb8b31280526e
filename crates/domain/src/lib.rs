//! Domain layer for the CampusWatch backend.
//!
//! This crate contains:
//! - Complaint, actor and dashboard models
//! - The complaint lifecycle engine and its guarded transitions
//! - Collaborator traits for storage, blobs, notifications and time
//! - Domain error types

pub mod errors;
pub mod models;
pub mod services;
