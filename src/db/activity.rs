//! Best-effort audit trail of mutations.
//!
//! Repository operations record what happened here as a side effect. The
//! trail is advisory: a failed audit write is logged and swallowed, never
//! allowed to fail or roll back the operation that triggered it.

use rusqlite::params;

use super::Database;
use crate::error::DbResult;

/// Action names as stored in `activity_logs.action_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    PhotoSaved,
    PhotoDeleted,
    ArRender,
    TagAdded,
    DataCleared,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::PhotoSaved => "PHOTO_SAVED",
            ActionType::PhotoDeleted => "PHOTO_DELETED",
            ActionType::ArRender => "AR_RENDER",
            ActionType::TagAdded => "TAG_ADDED",
            ActionType::DataCleared => "DATA_CLEARED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PHOTO_SAVED" => Some(ActionType::PhotoSaved),
            "PHOTO_DELETED" => Some(ActionType::PhotoDeleted),
            "AR_RENDER" => Some(ActionType::ArRender),
            "TAG_ADDED" => Some(ActionType::TagAdded),
            "DATA_CLEARED" => Some(ActionType::DataCleared),
            _ => None,
        }
    }
}

/// One audit row. `user_id` is `None` when the entry was written without
/// a user, or when its author has since been deleted.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action_type: String,
    pub description: Option<String>,
    pub created_at: String,
}

impl Database {
    /// Append one audit row. Storage failures propagate; callers that
    /// must not fail on audit outage use [`record_activity`] instead.
    ///
    /// [`record_activity`]: Database::record_activity
    pub fn log_activity(
        &self,
        user_id: Option<i64>,
        action: ActionType,
        description: &str,
    ) -> DbResult<()> {
        self.conn()?.execute(
            "INSERT INTO activity_logs (user_id, action_type, description) VALUES (?, ?, ?)",
            params![user_id, action.as_str(), description],
        )?;
        Ok(())
    }

    /// Fire-and-forget audit write used by repository mutations. Runs
    /// after the primary transaction commits, and any failure is caught
    /// here rather than surfaced.
    pub(crate) fn record_activity(&self, user_id: Option<i64>, action: ActionType, description: &str) {
        if let Err(e) = self.log_activity(user_id, action, description) {
            tracing::warn!(
                action = action.as_str(),
                error = %e,
                "failed to write activity log entry"
            );
        }
    }

    /// The newest audit entries, most recent first.
    pub fn recent_activity(&self, limit: usize) -> DbResult<Vec<ActivityEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, user_id, action_type, description, created_at
            FROM activity_logs
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )?;
        let entries = stmt
            .query_map([limit as i64], |row| {
                Ok(ActivityEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    action_type: row.get(2)?,
                    description: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }
}
