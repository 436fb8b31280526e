//! HTTP route handlers.

pub mod complaints;
pub mod dashboard;
pub mod health;
pub mod uploads;
