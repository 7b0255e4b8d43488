//! Error types for the photo store.

use thiserror::Error;

/// Errors surfaced by the database layer.
///
/// Lookups that find nothing are not errors; they return `Ok(None)` or an
/// empty collection. Activity-log writes are best-effort and never
/// propagate a failure to the caller's primary operation.
#[derive(Debug, Error)]
pub enum DbError {
    /// Schema creation or seeding failed. Fatal to application startup.
    #[error("schema initialization failed: {0}")]
    Schema(String),

    /// An operation was attempted before the handle was opened, or after
    /// it was closed. Indicates a call-ordering bug in the caller.
    #[error("database is not initialized")]
    NotInitialized,

    /// A read, write, or transaction failed at the storage engine level.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// File-level failure during export, import, or size probing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type DbResult<T> = Result<T, DbError>;
