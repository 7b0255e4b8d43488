//! Aggregate stats, bulk clear, and file-level backup of the store.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};

use super::{ActionType, Database, DEFAULT_USER_ID};
use crate::error::{DbError, DbResult};

/// Counts across the store plus a best-effort size of the backing file.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseStats {
    pub total_photos: i64,
    /// Distinct photos with at least one AR render.
    pub rendered_photos: i64,
    pub total_users: i64,
    pub total_sessions: i64,
    /// 0 when the store is in-memory or the file cannot be probed.
    pub disk_size_bytes: u64,
}

impl Database {
    pub fn stats(&self) -> DbResult<DatabaseStats> {
        let conn = self.conn()?;

        let total_photos =
            conn.query_row("SELECT COUNT(*) FROM photos", [], |row| row.get(0))?;
        let rendered_photos = conn.query_row(
            "SELECT COUNT(DISTINCT photo_id) FROM ar_renders",
            [],
            |row| row.get(0),
        )?;
        let total_users = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let total_sessions =
            conn.query_row("SELECT COUNT(*) FROM ar_sessions", [], |row| row.get(0))?;

        // Best-effort probe; a missing file is a 0, not an error.
        let disk_size_bytes = self
            .path()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(DatabaseStats {
            total_photos,
            rendered_photos,
            total_users,
            total_sessions,
            disk_size_bytes,
        })
    }

    /// Wipe every table in one transaction, keeping only the default user,
    /// and reset the id counters.
    ///
    /// Children are deleted before parents even though the cascades would
    /// cover most of it: explicit ordering keeps the operation correct on
    /// engines where cascade enforcement is optional.
    pub fn clear_all_data(&self) -> DbResult<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute("DELETE FROM activity_logs", [])?;
        tx.execute("DELETE FROM ar_renders", [])?;
        tx.execute("DELETE FROM ar_sessions", [])?;
        tx.execute("DELETE FROM photo_tags", [])?;
        tx.execute("DELETE FROM photo_metadata", [])?;
        tx.execute("DELETE FROM photos", [])?;
        tx.execute("DELETE FROM users WHERE id != ?", [DEFAULT_USER_ID])?;
        tx.execute("DELETE FROM sqlite_sequence", [])?;

        tx.commit()?;

        self.record_activity(Some(DEFAULT_USER_ID), ActionType::DataCleared, "All data cleared");
        tracing::info!("all data cleared");
        Ok(())
    }

    /// Copy the backing file to `dir/backup_<timestamp>.db` and return the
    /// path. Fails for in-memory stores and unwritable destinations.
    pub fn export_to(&self, dir: &Path) -> DbResult<PathBuf> {
        let source = self.path().ok_or_else(|| {
            DbError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "in-memory database has no backing file to export",
            ))
        })?;

        std::fs::create_dir_all(dir)?;

        let timestamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let dest = dir.join(format!("backup_{timestamp}.db"));

        std::fs::copy(source, &dest)?;
        tracing::info!(path = %dest.display(), "database exported");
        Ok(dest)
    }

    /// Replace the backing file with `source` and reopen the store.
    ///
    /// The handle is closed before the copy so no writes race the file
    /// swap, and reopened afterwards whether or not the copy succeeded
    /// (a failed copy leaves the previous contents in place). Reopening
    /// re-runs schema creation, which is a no-op on a valid backup.
    pub fn import_from(&mut self, source: &Path) -> DbResult<()> {
        let dest = self
            .path()
            .ok_or_else(|| {
                DbError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "in-memory database has no backing file to import into",
                ))
            })?
            .to_path_buf();

        self.close();
        let copied = std::fs::copy(source, &dest);
        self.reopen()?;
        copied?;
        tracing::info!(path = %source.display(), "database imported");
        Ok(())
    }
}
