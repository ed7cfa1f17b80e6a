//! Shared types, errors and collaborator traits

pub mod errors;
pub mod retry;
pub mod traits;
pub mod types;
