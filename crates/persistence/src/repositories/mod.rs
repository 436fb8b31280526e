//! Repository implementations for database operations.

pub mod complaint;

pub use complaint::ComplaintRepository;
