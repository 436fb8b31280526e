//! Custom Axum extractors.

pub mod actor;
pub mod json;

pub use actor::ActorAuth;
pub use json::{OptionalJson, ValidJson};
