//! Photo repository: CRUD and derived-state queries over photos,
//! metadata, tags, and AR render relationships.
//!
//! `ar_rendered` is a derived field, never a stored column: a photo counts
//! as rendered iff at least one `ar_renders` row references it, in any
//! session. Every projection below computes it with a join + null check.

use rusqlite::params;

use super::{ActionType, Database, DEFAULT_USER_ID};
use crate::error::DbResult;

/// Dimensions and byte size of the referenced image. All zeros until the
/// capture collaborator has measured the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhotoMetadata {
    pub width: i64,
    pub height: i64,
    pub size: i64,
}

/// A photo row joined with its metadata and derived render status.
#[derive(Debug, Clone)]
pub struct Photo {
    pub id: i64,
    pub uri: String,
    pub name: String,
    pub timestamp: String,
    pub ar_rendered: bool,
    pub metadata: PhotoMetadata,
}

/// Input to [`Database::save_photo`]. When `timestamp` is `None` the
/// store stamps the row with the current time.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub uri: String,
    pub name: String,
    pub timestamp: Option<String>,
    pub metadata: PhotoMetadata,
}

fn photo_from_row(row: &rusqlite::Row) -> rusqlite::Result<Photo> {
    Ok(Photo {
        id: row.get(0)?,
        uri: row.get(1)?,
        name: row.get(2)?,
        timestamp: row.get(3)?,
        metadata: PhotoMetadata {
            width: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
            height: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
            size: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
        },
        ar_rendered: row.get::<_, i64>(7)? == 1,
    })
}

/// Tag names are compared and stored trimmed and lower-cased, so "Beach",
/// " beach " and "beach" are the same tag.
fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

impl Database {
    /// Insert a photo together with its metadata row, atomically.
    ///
    /// Returns the new photo id. If the metadata insert fails the photo
    /// insert rolls back with it; no photo row ever exists without its
    /// metadata row.
    pub fn save_photo(&self, photo: &NewPhoto) -> DbResult<i64> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let photo_id = match &photo.timestamp {
            Some(ts) => {
                tx.execute(
                    "INSERT INTO photos (uri, name, timestamp) VALUES (?, ?, ?)",
                    params![photo.uri, photo.name, ts],
                )?;
                tx.last_insert_rowid()
            }
            None => {
                tx.execute(
                    "INSERT INTO photos (uri, name) VALUES (?, ?)",
                    params![photo.uri, photo.name],
                )?;
                tx.last_insert_rowid()
            }
        };

        tx.execute(
            "INSERT INTO photo_metadata (photo_id, width, height, size) VALUES (?, ?, ?, ?)",
            params![
                photo_id,
                photo.metadata.width,
                photo.metadata.height,
                photo.metadata.size
            ],
        )?;

        tx.commit()?;

        self.record_activity(
            Some(DEFAULT_USER_ID),
            ActionType::PhotoSaved,
            &format!("Photo saved: {}", photo.name),
        );
        tracing::debug!(photo_id, name = %photo.name, "photo saved");
        Ok(photo_id)
    }

    /// All photos, most recent first, with metadata defaulted to zeros
    /// where absent.
    pub fn get_all_photos(&self) -> DbResult<Vec<Photo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.id,
                p.uri,
                p.name,
                p.timestamp,
                pm.width,
                pm.height,
                pm.size,
                CASE WHEN ar.photo_id IS NOT NULL THEN 1 ELSE 0 END AS ar_rendered
            FROM photos p
            LEFT JOIN photo_metadata pm ON p.id = pm.photo_id
            LEFT JOIN (SELECT DISTINCT photo_id FROM ar_renders) ar ON p.id = ar.photo_id
            ORDER BY p.timestamp DESC, p.id DESC
            "#,
        )?;
        let photos = stmt
            .query_map([], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    /// A single photo by id, or `None` if absent. A missing id is a
    /// defined empty result, not an error.
    pub fn get_photo_by_id(&self, id: i64) -> DbResult<Option<Photo>> {
        let conn = self.conn()?;
        let result = conn.query_row(
            r#"
            SELECT
                p.id,
                p.uri,
                p.name,
                p.timestamp,
                pm.width,
                pm.height,
                pm.size,
                CASE WHEN ar.photo_id IS NOT NULL THEN 1 ELSE 0 END AS ar_rendered
            FROM photos p
            LEFT JOIN photo_metadata pm ON p.id = pm.photo_id
            LEFT JOIN (SELECT DISTINCT photo_id FROM ar_renders) ar ON p.id = ar.photo_id
            WHERE p.id = ?
            "#,
            [id],
            photo_from_row,
        );
        match result {
            Ok(photo) => Ok(Some(photo)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a photo. The foreign-key cascades clear its metadata, tags,
    /// and render rows; AR sessions belong to the user and survive.
    pub fn delete_photo(&self, id: i64) -> DbResult<()> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // Capture the name for the audit entry before the row goes away.
        let name = match tx.query_row("SELECT name FROM photos WHERE id = ?", [id], |row| {
            row.get::<_, String>(0)
        }) {
            Ok(name) => name,
            Err(rusqlite::Error::QueryReturnedNoRows) => "unknown".to_string(),
            Err(e) => return Err(e.into()),
        };

        tx.execute("DELETE FROM photos WHERE id = ?", [id])?;
        tx.commit()?;

        self.record_activity(
            Some(DEFAULT_USER_ID),
            ActionType::PhotoDeleted,
            &format!("Photo deleted: {name}"),
        );
        tracing::debug!(photo_id = id, "photo deleted");
        Ok(())
    }

    /// Record that a photo was rendered in AR.
    ///
    /// Attaches the photo to the default user's most recent session,
    /// creating one lazily if none exists. Re-rendering the same photo in
    /// the same session is a silent no-op.
    ///
    /// `rendered = false` is a defined no-op: the status is derived from
    /// the existence of render rows and cannot be unset here.
    pub fn mark_photo_rendered(&self, photo_id: i64, rendered: bool) -> DbResult<()> {
        if !rendered {
            return Ok(());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        // Read-then-create has a duplicate-session race under concurrent
        // writers; this store assumes a single logical writer.
        let session_id = match tx.query_row(
            "SELECT id FROM ar_sessions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT 1",
            [DEFAULT_USER_ID],
            |row| row.get::<_, i64>(0),
        ) {
            Ok(id) => id,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                tx.execute(
                    "INSERT INTO ar_sessions (user_id) VALUES (?)",
                    [DEFAULT_USER_ID],
                )?;
                tx.last_insert_rowid()
            }
            Err(e) => return Err(e.into()),
        };

        tx.execute(
            "INSERT OR IGNORE INTO ar_renders (session_id, photo_id) VALUES (?, ?)",
            params![session_id, photo_id],
        )?;
        tx.commit()?;

        self.record_activity(
            Some(DEFAULT_USER_ID),
            ActionType::ArRender,
            &format!("Photo rendered in AR: id {photo_id}"),
        );
        Ok(())
    }

    /// Attach a tag to a photo. Duplicate (photo, tag) pairs are silently
    /// ignored.
    pub fn add_photo_tag(&self, photo_id: i64, tag: &str) -> DbResult<()> {
        let tag = normalize_tag(tag);
        self.conn()?.execute(
            "INSERT OR IGNORE INTO photo_tags (photo_id, tag_name) VALUES (?, ?)",
            params![photo_id, tag],
        )?;

        self.record_activity(
            Some(DEFAULT_USER_ID),
            ActionType::TagAdded,
            &format!("Tag added: {tag} for photo id {photo_id}"),
        );
        Ok(())
    }

    /// Tag names for a photo, alphabetically.
    pub fn get_photo_tags(&self, photo_id: i64) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT tag_name FROM photo_tags WHERE photo_id = ? ORDER BY tag_name",
        )?;
        let tags = stmt
            .query_map([photo_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    /// Photos whose tags contain `fragment` (case-insensitive substring),
    /// most recent first.
    pub fn search_photos_by_tag(&self, fragment: &str) -> DbResult<Vec<Photo>> {
        let pattern = format!("%{}%", normalize_tag(fragment));
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT
                p.id,
                p.uri,
                p.name,
                p.timestamp,
                pm.width,
                pm.height,
                pm.size,
                CASE WHEN ar.photo_id IS NOT NULL THEN 1 ELSE 0 END AS ar_rendered
            FROM photos p
            LEFT JOIN photo_metadata pm ON p.id = pm.photo_id
            LEFT JOIN (SELECT DISTINCT photo_id FROM ar_renders) ar ON p.id = ar.photo_id
            INNER JOIN photo_tags pt ON p.id = pt.photo_id
            WHERE pt.tag_name LIKE ?
            ORDER BY p.timestamp DESC, p.id DESC
            "#,
        )?;
        let photos = stmt
            .query_map([pattern], photo_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }

    /// Photos with at least one AR render, ordered by their most recent
    /// render. `ar_rendered` is true for every returned photo by
    /// construction.
    pub fn get_rendered_photos(&self) -> DbResult<Vec<Photo>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT
                p.id,
                p.uri,
                p.name,
                p.timestamp,
                pm.width,
                pm.height,
                pm.size,
                MAX(ar.rendered_at) AS last_rendered_at
            FROM photos p
            INNER JOIN ar_renders ar ON p.id = ar.photo_id
            LEFT JOIN photo_metadata pm ON p.id = pm.photo_id
            GROUP BY p.id
            ORDER BY last_rendered_at DESC, p.id DESC
            "#,
        )?;
        let photos = stmt
            .query_map([], |row| {
                Ok(Photo {
                    id: row.get(0)?,
                    uri: row.get(1)?,
                    name: row.get(2)?,
                    timestamp: row.get(3)?,
                    metadata: PhotoMetadata {
                        width: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        height: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                        size: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                    },
                    ar_rendered: true,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn sample_photo(name: &str, timestamp: &str) -> NewPhoto {
        NewPhoto {
            uri: format!("file:///photos/{name}"),
            name: name.to_string(),
            timestamp: Some(timestamp.to_string()),
            metadata: PhotoMetadata {
                width: 100,
                height: 200,
                size: 5000,
            },
        }
    }

    fn count(db: &Database, sql: &str, id: i64) -> i64 {
        db.conn()
            .unwrap()
            .query_row(sql, [id], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn save_and_read_back() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();

        let photo = db.get_photo_by_id(id).unwrap().unwrap();
        assert_eq!(photo.uri, "file:///photos/a.jpg");
        assert_eq!(photo.name, "a.jpg");
        assert_eq!(
            photo.metadata,
            PhotoMetadata {
                width: 100,
                height: 200,
                size: 5000
            }
        );
        assert!(!photo.ar_rendered);
    }

    #[test]
    fn save_emits_activity_entry() {
        let db = test_db();
        db.save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();

        let entries = db.recent_activity(10).unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action_type == "PHOTO_SAVED" && e.user_id == Some(DEFAULT_USER_ID)));
    }

    #[test]
    fn missing_photo_is_none_not_error() {
        let db = test_db();
        assert!(db.get_photo_by_id(999).unwrap().is_none());
    }

    #[test]
    fn all_photos_most_recent_first() {
        let db = test_db();
        let old = db
            .save_photo(&sample_photo("old.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        let new = db
            .save_photo(&sample_photo("new.jpg", "2023-10-26T11:00:00Z"))
            .unwrap();

        let photos = db.get_all_photos().unwrap();
        assert_eq!(photos.len(), 2);
        assert_eq!(photos[0].id, new);
        assert_eq!(photos[1].id, old);
    }

    #[test]
    fn render_status_is_derived_and_idempotent() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();

        db.mark_photo_rendered(id, true).unwrap();
        assert!(db.get_photo_by_id(id).unwrap().unwrap().ar_rendered);
        assert!(db.get_rendered_photos().unwrap().iter().any(|p| p.id == id));

        // Second call is a silent no-op: still one render row, one session.
        db.mark_photo_rendered(id, true).unwrap();
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM ar_renders WHERE photo_id = ?", id),
            1
        );
        assert_eq!(
            count(
                &db,
                "SELECT COUNT(*) FROM ar_sessions WHERE user_id = ?",
                DEFAULT_USER_ID
            ),
            1
        );
    }

    #[test]
    fn mark_unrendered_is_a_noop() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        db.mark_photo_rendered(id, true).unwrap();

        db.mark_photo_rendered(id, false).unwrap();
        assert!(db.get_photo_by_id(id).unwrap().unwrap().ar_rendered);
    }

    #[test]
    fn session_is_created_lazily_and_reused() {
        let db = test_db();
        let a = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        let b = db
            .save_photo(&sample_photo("b.jpg", "2023-10-26T11:00:00Z"))
            .unwrap();

        let sessions = |db: &Database| -> i64 {
            db.conn()
                .unwrap()
                .query_row("SELECT COUNT(*) FROM ar_sessions", [], |row| row.get(0))
                .unwrap()
        };

        assert_eq!(sessions(&db), 0);
        db.mark_photo_rendered(a, true).unwrap();
        db.mark_photo_rendered(b, true).unwrap();
        assert_eq!(sessions(&db), 1);
    }

    #[test]
    fn tags_are_normalized_and_deduplicated() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();

        db.add_photo_tag(id, " Beach ").unwrap();
        db.add_photo_tag(id, "beach").unwrap();
        db.add_photo_tag(id, "Alpha").unwrap();

        assert_eq!(db.get_photo_tags(id).unwrap(), vec!["alpha", "beach"]);
    }

    #[test]
    fn search_by_tag_fragment() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        db.add_photo_tag(id, " Beach ").unwrap();

        let hits = db.search_photos_by_tag("ea").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);

        assert!(db.search_photos_by_tag("xyz").unwrap().is_empty());
    }

    #[test]
    fn search_returns_distinct_photos() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        db.add_photo_tag(id, "beach").unwrap();
        db.add_photo_tag(id, "bleak").unwrap();

        // Both tags match the fragment; the photo still appears once.
        let hits = db.search_photos_by_tag("b").unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn delete_cascades_to_children_but_not_sessions() {
        let db = test_db();
        let id = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        db.add_photo_tag(id, "beach").unwrap();
        db.mark_photo_rendered(id, true).unwrap();

        db.delete_photo(id).unwrap();

        assert!(db.get_photo_by_id(id).unwrap().is_none());
        assert!(db.get_photo_tags(id).unwrap().is_empty());
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM photo_metadata WHERE photo_id = ?", id),
            0
        );
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM photo_tags WHERE photo_id = ?", id),
            0
        );
        assert_eq!(
            count(&db, "SELECT COUNT(*) FROM ar_renders WHERE photo_id = ?", id),
            0
        );
        // The session belongs to the user, not the photo.
        assert_eq!(
            count(
                &db,
                "SELECT COUNT(*) FROM ar_sessions WHERE user_id = ?",
                DEFAULT_USER_ID
            ),
            1
        );
    }

    #[test]
    fn delete_missing_photo_logs_placeholder_name() {
        let db = test_db();
        db.delete_photo(12345).unwrap();

        let entries = db.recent_activity(10).unwrap();
        let entry = entries
            .iter()
            .find(|e| e.action_type == "PHOTO_DELETED")
            .unwrap();
        assert_eq!(entry.description.as_deref(), Some("Photo deleted: unknown"));
    }

    #[test]
    fn rendered_photos_ordered_by_latest_render() {
        let db = test_db();
        let a = db
            .save_photo(&sample_photo("a.jpg", "2023-10-26T10:00:00Z"))
            .unwrap();
        let b = db
            .save_photo(&sample_photo("b.jpg", "2023-10-26T11:00:00Z"))
            .unwrap();

        let conn = db.conn().unwrap();
        conn.execute(
            "INSERT INTO ar_sessions (id, user_id) VALUES (1, ?)",
            [DEFAULT_USER_ID],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ar_renders (session_id, photo_id, rendered_at) VALUES (1, ?, '2023-10-26T12:00:00Z')",
            [a],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ar_renders (session_id, photo_id, rendered_at) VALUES (1, ?, '2023-10-26T13:00:00Z')",
            [b],
        )
        .unwrap();

        let rendered = db.get_rendered_photos().unwrap();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].id, b);
        assert_eq!(rendered[1].id, a);
        assert!(rendered.iter().all(|p| p.ar_rendered));
    }

    #[test]
    fn full_capture_lifecycle() {
        let db = test_db();
        let id = db
            .save_photo(&NewPhoto {
                uri: "file://a.jpg".to_string(),
                name: "a.jpg".to_string(),
                timestamp: Some("2023-10-26T10:00:00Z".to_string()),
                metadata: PhotoMetadata {
                    width: 100,
                    height: 200,
                    size: 5000,
                },
            })
            .unwrap();

        db.add_photo_tag(id, " Beach ").unwrap();
        assert_eq!(db.get_photo_tags(id).unwrap(), vec!["beach"]);

        db.mark_photo_rendered(id, true).unwrap();
        assert!(db.get_all_photos().unwrap()[0].ar_rendered);

        db.delete_photo(id).unwrap();
        assert!(db.get_photo_by_id(id).unwrap().is_none());
        assert!(db.get_photo_tags(id).unwrap().is_empty());
    }
}
