use std::path::{Path, PathBuf};

use prasad_shared::constants::UPLOADS_URL_PREFIX;
use prasad_shared::ImageCategory;
use tokio::fs;
use tracing::{debug, info};

use crate::error::ServerError;

/// Directory layout under the upload root: one sub-directory per category.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Create the root and every category directory that is missing.
    /// Existing directories are left untouched.
    pub async fn ensure(root: PathBuf, categories: &[ImageCategory]) -> Result<Self, ServerError> {
        let layout = Self { root };

        fs::create_dir_all(&layout.root).await.map_err(|e| {
            ServerError::Storage(format!(
                "Failed to create upload root '{}': {}",
                layout.root.display(),
                e
            ))
        })?;

        for category in categories {
            let dir = layout.category_dir(*category);
            fs::create_dir_all(&dir).await.map_err(|e| {
                ServerError::Storage(format!(
                    "Failed to create upload directory '{}': {}",
                    dir.display(),
                    e
                ))
            })?;
            debug!(category = %category, path = %dir.display(), "Upload directory ready");
        }

        info!(path = %layout.root.display(), "Upload storage initialized");
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: ImageCategory) -> PathBuf {
        self.root.join(category.dir_name())
    }

    /// Where a stored file of `category` lives. Rejects names that could
    /// escape the category directory.
    pub fn file_path(
        &self,
        category: ImageCategory,
        stored_filename: &str,
    ) -> Result<PathBuf, ServerError> {
        if stored_filename.is_empty()
            || stored_filename.contains('/')
            || stored_filename.contains('\\')
            || stored_filename.contains("..")
        {
            return Err(ServerError::BadRequest(
                "Path traversal detected".to_string(),
            ));
        }
        Ok(self.category_dir(category).join(stored_filename))
    }

    /// URL under which the static file service exposes a stored file.
    pub fn public_url(category: ImageCategory, stored_filename: &str) -> String {
        format!("{UPLOADS_URL_PREFIX}/{}/{stored_filename}", category.dir_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ensure_creates_category_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("uploads");

        let layout = StorageLayout::ensure(root.clone(), &ImageCategory::ALL)
            .await
            .unwrap();

        assert!(root.is_dir());
        for category in ImageCategory::ALL {
            assert!(layout.category_dir(category).is_dir());
        }
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("uploads");

        let layout = StorageLayout::ensure(root.clone(), &ImageCategory::ALL)
            .await
            .unwrap();
        let keep = layout.category_dir(ImageCategory::Profile).join("existing.jpg");
        std::fs::write(&keep, b"data").unwrap();

        StorageLayout::ensure(root, &ImageCategory::ALL).await.unwrap();
        assert_eq!(std::fs::read(&keep).unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_ensure_fails_when_root_is_a_file() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("uploads");
        std::fs::write(&root, b"not a directory").unwrap();

        assert!(StorageLayout::ensure(root, &ImageCategory::ALL).await.is_err());
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            StorageLayout::public_url(ImageCategory::Profile, "profile_x.jpg"),
            "/uploads/profile/profile_x.jpg"
        );
    }

    #[test]
    fn test_file_path_rejects_traversal() {
        let layout = StorageLayout {
            root: PathBuf::from("uploads"),
        };
        assert!(layout.file_path(ImageCategory::Product, "../escape.jpg").is_err());
        assert!(layout.file_path(ImageCategory::Product, "a/b.jpg").is_err());
        assert_eq!(
            layout.file_path(ImageCategory::Product, "product_1.png").unwrap(),
            PathBuf::from("uploads").join("product").join("product_1.png")
        );
    }
}
