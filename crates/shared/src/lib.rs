//! Shared utilities for the CampusWatch backend.
//!
//! - Actor token verification (JWT)
//! - Text normalization and validation helpers

pub mod jwt;
pub mod validation;
