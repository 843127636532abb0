//! The record-store seam used by the image service.
//!
//! [`ImageRepository`] is what the server depends on; [`SqliteImageRepository`]
//! is the production implementation over a shared [`Database`].

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{ImageFilter, ImageRecord, NewImage};

/// Storage for image records. Implementations must be shareable across
/// request tasks.
pub trait ImageRepository: Send + Sync {
    /// Persist a new record and return the id assigned to it.
    fn insert(&self, image: &NewImage) -> Result<Uuid>;

    fn get(&self, id: Uuid) -> Result<Option<ImageRecord>>;

    /// Matching records in arrival order.
    fn find(&self, filter: ImageFilter, offset: u64, limit: u64) -> Result<Vec<ImageRecord>>;

    fn count(&self, filter: ImageFilter) -> Result<u64>;

    /// Remove a record. Returns `false` if it did not exist.
    fn delete(&self, id: Uuid) -> Result<bool>;
}

/// [`ImageRepository`] backed by SQLite. The connection is locked per
/// statement only.
pub struct SqliteImageRepository {
    db: Mutex<Database>,
}

impl SqliteImageRepository {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl ImageRepository for SqliteImageRepository {
    fn insert(&self, image: &NewImage) -> Result<Uuid> {
        self.db()?.insert_image(image)
    }

    fn get(&self, id: Uuid) -> Result<Option<ImageRecord>> {
        self.db()?.get_image(id)
    }

    fn find(&self, filter: ImageFilter, offset: u64, limit: u64) -> Result<Vec<ImageRecord>> {
        self.db()?.find_images(filter, offset, limit)
    }

    fn count(&self, filter: ImageFilter) -> Result<u64> {
        self.db()?.count_images(filter)
    }

    fn delete(&self, id: Uuid) -> Result<bool> {
        self.db()?.delete_image(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use prasad_shared::{ImageCategory, ImageMetadata};

    fn new_image(stored_filename: &str) -> NewImage {
        NewImage {
            public_url: format!("/uploads/product/{stored_filename}"),
            category: ImageCategory::Product,
            original_filename: "drone.png".to_string(),
            stored_filename: stored_filename.to_string(),
            storage_path: format!("uploads/product/{stored_filename}"),
            content_type: "image/png".to_string(),
            size_bytes: 10,
            uploaded_at: Utc::now(),
            metadata: ImageMetadata::new(),
        }
    }

    #[test]
    fn test_repository_through_trait_object() {
        let dir = tempfile::tempdir().unwrap();
        let repo: Arc<dyn ImageRepository> =
            Arc::new(SqliteImageRepository::open_at(&dir.path().join("repo.db")).unwrap());

        let id = repo.insert(&new_image("a.png")).unwrap();
        assert_eq!(repo.count(ImageFilter::All).unwrap(), 1);
        assert_eq!(repo.get(id).unwrap().unwrap().stored_filename, "a.png");
        assert!(repo.delete(id).unwrap());
        assert_eq!(repo.count(ImageFilter::All).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_inserts_from_threads() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(SqliteImageRepository::open_at(&dir.path().join("repo.db")).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let repo = repo.clone();
                std::thread::spawn(move || repo.insert(&new_image(&format!("t{i}.png"))).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(repo.count(ImageFilter::Category(ImageCategory::Product)).unwrap(), 4);
    }
}
