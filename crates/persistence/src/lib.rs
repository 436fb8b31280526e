//! Persistence layer for the CampusWatch backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - The PostgreSQL complaint repository
//! - The filesystem blob store

pub mod blob;
pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;

pub use blob::FsBlobStore;
pub use repositories::ComplaintRepository;
