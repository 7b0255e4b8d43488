//! The embedded photo store.
//!
//! [`Database`] is the single per-process handle: constructed once at
//! startup, threaded through to whoever needs it, and torn down at
//! shutdown. All reads and writes go through it; only `close`/`reopen`
//! (used by import) ever replace the underlying connection.

mod schema;

pub mod activity;
pub mod maintenance;
pub mod photos;
pub mod query;

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{DbError, DbResult};

pub use activity::{ActionType, ActivityEntry};
pub use maintenance::DatabaseStats;
pub use photos::{NewPhoto, Photo, PhotoMetadata};
pub use schema::DEFAULT_USER_ID;

pub struct Database {
    /// None for in-memory databases, which have no backing file to probe
    /// or export.
    path: Option<PathBuf>,
    /// Taken by `close()`; every accessor fails with `NotInitialized`
    /// until `reopen()` restores it.
    conn: Option<Connection>,
}

impl Database {
    /// Open (or create) the store at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self {
            path: Some(path.to_path_buf()),
            conn: Some(conn),
        };
        db.initialize()?;
        tracing::info!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let db = Self {
            path: None,
            conn: Some(Connection::open_in_memory()?),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Create tables, indexes, and seed rows. Safe to call repeatedly:
    /// DDL is `IF NOT EXISTS` and seeding is `INSERT OR IGNORE`.
    pub fn initialize(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(schema::PRAGMAS)
            .map_err(|e| DbError::Schema(format!("failed to apply pragmas: {e}")))?;
        conn.execute_batch(schema::SCHEMA)
            .map_err(|e| DbError::Schema(format!("failed to create tables: {e}")))?;
        conn.execute_batch(schema::SEED)
            .map_err(|e| DbError::Schema(format!("failed to seed defaults: {e}")))?;
        Ok(())
    }

    /// The backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the handle. Subsequent operations fail with
    /// [`DbError::NotInitialized`] until `reopen()`.
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(error = %e, "error closing database handle");
            } else {
                tracing::info!("database closed");
            }
        }
    }

    /// Re-open the same backing file and re-run schema creation.
    pub fn reopen(&mut self) -> DbResult<()> {
        let path = self.path.clone().ok_or(DbError::NotInitialized)?;
        self.conn = Some(Connection::open(&path)?);
        self.initialize()?;
        tracing::info!(path = %path.display(), "database reopened");
        Ok(())
    }

    pub(crate) fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::NotInitialized)
    }
}
