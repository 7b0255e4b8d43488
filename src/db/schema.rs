//! DDL and seed data for the photo store.
//!
//! The schema is normalized: photo metadata, tags, and AR render
//! relationships live in their own tables keyed back to `photos`. The
//! rendered status of a photo is never stored; it is derived from the
//! existence of `ar_renders` rows at read time.

/// The seeded user that owns AR sessions and activity entries when no
/// explicit user is involved. Guaranteed to exist after initialization and
/// survives bulk clears.
pub const DEFAULT_USER_ID: i64 = 1;

/// Applied to every new connection. SQLite leaves foreign keys off by
/// default, and every cascade rule below depends on them.
pub(crate) const PRAGMAS: &str = "
PRAGMA foreign_keys = ON;
PRAGMA busy_timeout = 5000;
";

pub(crate) const SCHEMA: &str = r#"
-- Users own AR sessions and (nullably) activity log entries
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- Root entity of the media domain; uri is an opaque reference, the
-- image bytes themselves are never read by this layer
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uri TEXT NOT NULL,
    name TEXT NOT NULL,
    timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- 1:1 with photos, split out for normalization; a photo without a
-- metadata row reads back as zeros
CREATE TABLE IF NOT EXISTS photo_metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_id INTEGER NOT NULL,
    width INTEGER DEFAULT 0,
    height INTEGER DEFAULT 0,
    size INTEGER DEFAULT 0,
    FOREIGN KEY (photo_id) REFERENCES photos (id) ON DELETE CASCADE
);

-- One AR activity grouping per user; created lazily on first render
CREATE TABLE IF NOT EXISTS ar_sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
);

-- Session <-> photo association; re-rendering the same photo in the
-- same session is an INSERT OR IGNORE no-op
CREATE TABLE IF NOT EXISTS ar_renders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL,
    photo_id INTEGER NOT NULL,
    rendered_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    render_duration INTEGER DEFAULT 0,
    FOREIGN KEY (session_id) REFERENCES ar_sessions (id) ON DELETE CASCADE,
    FOREIGN KEY (photo_id) REFERENCES photos (id) ON DELETE CASCADE,
    UNIQUE(session_id, photo_id)
);

-- Tag names are stored trimmed and lower-cased
CREATE TABLE IF NOT EXISTS photo_tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_id INTEGER NOT NULL,
    tag_name TEXT NOT NULL,
    FOREIGN KEY (photo_id) REFERENCES photos (id) ON DELETE CASCADE,
    UNIQUE(photo_id, tag_name)
);

-- Small persisted key/value settings
CREATE TABLE IF NOT EXISTS system_config (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    config_key TEXT UNIQUE NOT NULL,
    config_value TEXT NOT NULL,
    updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

-- Append-only audit trail; log rows outlive their author (SET NULL,
-- not CASCADE)
CREATE TABLE IF NOT EXISTS activity_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    action_type TEXT NOT NULL,
    description TEXT,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE SET NULL
);

-- Indexes for the listing, join-derivation, and log access patterns
CREATE INDEX IF NOT EXISTS idx_photos_timestamp ON photos (timestamp);
CREATE INDEX IF NOT EXISTS idx_ar_renders_photo_id ON ar_renders (photo_id);
CREATE INDEX IF NOT EXISTS idx_ar_renders_session_id ON ar_renders (session_id);
CREATE INDEX IF NOT EXISTS idx_photo_tags_photo_id ON photo_tags (photo_id);
CREATE INDEX IF NOT EXISTS idx_activity_logs_user_id ON activity_logs (user_id);
CREATE INDEX IF NOT EXISTS idx_activity_logs_created_at ON activity_logs (created_at);
"#;

pub(crate) const SEED: &str = r#"
INSERT OR IGNORE INTO users (id, name, email) VALUES (1, 'Default User', 'user@example.com');
INSERT OR IGNORE INTO system_config (config_key, config_value) VALUES
    ('app_version', '1.0.0'),
    ('ar_quality', 'high'),
    ('auto_backup', 'true'),
    ('max_photos', '1000');
"#;
