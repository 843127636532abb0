//! v001 -- Initial schema creation.
//!
//! Creates the `images` table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Images (uploaded file metadata)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS images (
    seq               INTEGER PRIMARY KEY AUTOINCREMENT,  -- arrival order
    id                TEXT NOT NULL UNIQUE,               -- UUID v4
    public_url        TEXT NOT NULL,
    category          TEXT NOT NULL,                      -- profile | product | category
    original_filename TEXT NOT NULL,
    stored_filename   TEXT NOT NULL UNIQUE,
    storage_path      TEXT NOT NULL,
    content_type      TEXT NOT NULL,
    size_bytes        INTEGER NOT NULL,
    uploaded_at       TEXT NOT NULL,                      -- RFC-3339
    metadata          TEXT NOT NULL DEFAULT '{}'          -- JSON object of strings
);

CREATE INDEX IF NOT EXISTS idx_images_category_seq ON images(category, seq);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
