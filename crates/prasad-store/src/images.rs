use chrono::{DateTime, Utc};
use prasad_shared::{ImageCategory, ImageMetadata};
use rusqlite::params;
use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ImageFilter, ImageRecord, NewImage};

const SELECT_COLUMNS: &str = "SELECT id, public_url, category, original_filename, stored_filename,
        storage_path, content_type, size_bytes, uploaded_at, metadata
 FROM images";

impl Database {
    pub fn insert_image(&self, image: &NewImage) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let metadata = serde_json::to_string(&image.metadata)?;

        self.conn().execute(
            "INSERT INTO images (id, public_url, category, original_filename, stored_filename,
                                 storage_path, content_type, size_bytes, uploaded_at, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.to_string(),
                image.public_url,
                image.category.as_str(),
                image.original_filename,
                image.stored_filename,
                image.storage_path,
                image.content_type,
                image.size_bytes as i64,
                image.uploaded_at.to_rfc3339(),
                metadata,
            ],
        )?;
        Ok(id)
    }

    pub fn get_image(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        let result = self.conn().query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.to_string()],
            row_to_raw,
        );

        match result {
            Ok(raw) => raw.into_record().map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// Records matching `filter` in arrival order, skipping `offset` and
    /// returning at most `limit`.
    pub fn find_images(&self, filter: ImageFilter, offset: u64, limit: u64) -> Result<Vec<ImageRecord>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_COLUMNS}
             WHERE (?1 IS NULL OR category = ?1)
             ORDER BY seq ASC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(
            params![
                filter.category().map(|c| c.as_str()),
                clamp_i64(limit),
                clamp_i64(offset),
            ],
            row_to_raw,
        )?;

        let mut images = Vec::new();
        for row in rows {
            images.push(row?.into_record()?);
        }
        Ok(images)
    }

    pub fn count_images(&self, filter: ImageFilter) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM images WHERE (?1 IS NULL OR category = ?1)",
            params![filter.category().map(|c| c.as_str())],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    // only removes the db record, not the file on disk
    pub fn delete_image(&self, id: Uuid) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM images WHERE id = ?1", params![id.to_string()])?;
        Ok(affected > 0)
    }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Column values as stored, before parsing into domain types.
struct RawImageRow {
    id: String,
    public_url: String,
    category: String,
    original_filename: String,
    stored_filename: String,
    storage_path: String,
    content_type: String,
    size_bytes: i64,
    uploaded_at: String,
    metadata: String,
}

fn row_to_raw(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawImageRow> {
    Ok(RawImageRow {
        id: row.get(0)?,
        public_url: row.get(1)?,
        category: row.get(2)?,
        original_filename: row.get(3)?,
        stored_filename: row.get(4)?,
        storage_path: row.get(5)?,
        content_type: row.get(6)?,
        size_bytes: row.get(7)?,
        uploaded_at: row.get(8)?,
        metadata: row.get(9)?,
    })
}

impl RawImageRow {
    fn into_record(self) -> Result<ImageRecord> {
        let id = Uuid::parse_str(&self.id)?;
        let category: ImageCategory = self.category.parse()?;
        let uploaded_at: DateTime<Utc> =
            DateTime::parse_from_rfc3339(&self.uploaded_at)?.with_timezone(&Utc);
        let metadata: ImageMetadata = serde_json::from_str(&self.metadata)?;

        Ok(ImageRecord {
            id,
            public_url: self.public_url,
            category,
            original_filename: self.original_filename,
            stored_filename: self.stored_filename,
            storage_path: self.storage_path,
            content_type: self.content_type,
            size_bytes: self.size_bytes.max(0) as u64,
            uploaded_at,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (Database, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(&dir.path().join("images.db")).unwrap();
        (db, dir)
    }

    fn new_image(category: ImageCategory, stored_filename: &str) -> NewImage {
        let mut metadata = ImageMetadata::new();
        metadata.insert("user_id".to_string(), "123".to_string());
        NewImage {
            public_url: format!("/uploads/{category}/{stored_filename}"),
            category,
            original_filename: "photo.jpg".to_string(),
            stored_filename: stored_filename.to_string(),
            storage_path: format!("uploads/{category}/{stored_filename}"),
            content_type: "image/jpeg".to_string(),
            size_bytes: 2048,
            uploaded_at: Utc::now(),
            metadata,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let (db, _dir) = test_db();
        let image = new_image(ImageCategory::Profile, "profile_a.jpg");

        let id = db.insert_image(&image).unwrap();
        let fetched = db.get_image(id).unwrap().expect("record should exist");

        assert_eq!(fetched.id, id);
        assert_eq!(fetched.category, ImageCategory::Profile);
        assert_eq!(fetched.size_bytes, 2048);
        assert_eq!(fetched.metadata.get("user_id").map(String::as_str), Some("123"));
        // RFC-3339 keeps sub-second precision
        assert_eq!(fetched.uploaded_at, image.uploaded_at);
    }

    #[test]
    fn test_get_missing_is_none() {
        let (db, _dir) = test_db();
        assert!(db.get_image(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_find_keeps_arrival_order_and_paginates() {
        let (db, _dir) = test_db();
        let first = db.insert_image(&new_image(ImageCategory::Profile, "p1.jpg")).unwrap();
        db.insert_image(&new_image(ImageCategory::Product, "x1.jpg")).unwrap();
        let second = db.insert_image(&new_image(ImageCategory::Profile, "p2.jpg")).unwrap();
        let third = db.insert_image(&new_image(ImageCategory::Profile, "p3.jpg")).unwrap();

        let filter = ImageFilter::Category(ImageCategory::Profile);
        let all: Vec<Uuid> = db.find_images(filter, 0, 50).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(all, vec![first, second, third]);

        let page: Vec<Uuid> = db.find_images(filter, 1, 1).unwrap().iter().map(|r| r.id).collect();
        assert_eq!(page, vec![second]);

        assert!(db.find_images(filter, 10, 5).unwrap().is_empty());
        assert_eq!(db.find_images(ImageFilter::All, 0, 50).unwrap().len(), 4);
    }

    #[test]
    fn test_count() {
        let (db, _dir) = test_db();
        db.insert_image(&new_image(ImageCategory::Profile, "p1.jpg")).unwrap();
        db.insert_image(&new_image(ImageCategory::Category, "c1.jpg")).unwrap();

        assert_eq!(db.count_images(ImageFilter::All).unwrap(), 2);
        assert_eq!(db.count_images(ImageFilter::Category(ImageCategory::Profile)).unwrap(), 1);
        assert_eq!(db.count_images(ImageFilter::Category(ImageCategory::Product)).unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let (db, _dir) = test_db();
        let id = db.insert_image(&new_image(ImageCategory::Profile, "p1.jpg")).unwrap();

        assert!(db.delete_image(id).unwrap());
        assert!(db.get_image(id).unwrap().is_none());
        assert!(!db.delete_image(id).unwrap());
    }

    #[test]
    fn test_duplicate_stored_filename_rejected() {
        let (db, _dir) = test_db();
        db.insert_image(&new_image(ImageCategory::Profile, "same.jpg")).unwrap();
        assert!(db.insert_image(&new_image(ImageCategory::Profile, "same.jpg")).is_err());
    }
}
