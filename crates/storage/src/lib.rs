//! Storage Layer
//!
//! In-memory persistence with repository pattern. Collections are guarded
//! by mutexes and ids are allocated monotonically, so the repository can be
//! shared across tasks behind an `Arc`.

mod repository;

pub use repository::Repository;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage error: {0}")]
    Internal(String),
    #[error("Record not found")]
    NotFound,
    #[error("Constraint violated: {0}")]
    Conflict(String),
}
