//! Image persistence, lookup and deletion.
//!
//! [`ImageService`] ties the upload checks, filename generation and storage
//! layout to the record store. A stored file and its record are created
//! together by [`ImageService::save`] and removed together by
//! [`ImageService::delete`].

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use prasad_shared::{ImageCategory, ImageMetadata};
use prasad_store::{ImageFilter, ImageRecord, ImageRepository, NewImage, StoreError};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWriteExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::UploadConfig;
use crate::error::ServerError;
use crate::filename::generate_filename;
use crate::layout::StorageLayout;
use crate::pending::PendingFile;
use crate::validate::UploadValidator;

/// Everything the client told us about an upload besides its bytes.
#[derive(Debug, Clone)]
pub struct IncomingImage {
    pub original_filename: String,
    pub content_type: String,
    pub category: ImageCategory,
    pub metadata: ImageMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageStats {
    pub total: u64,
    pub by_category: Vec<(ImageCategory, u64)>,
}

pub struct ImageService {
    layout: StorageLayout,
    validator: UploadValidator,
    repo: Arc<dyn ImageRepository>,
}

impl ImageService {
    /// Build the service, creating the upload directories if needed.
    pub async fn new(
        config: &UploadConfig,
        repo: Arc<dyn ImageRepository>,
    ) -> Result<Self, ServerError> {
        let layout = StorageLayout::ensure(config.root.clone(), &ImageCategory::ALL).await?;
        Ok(Self {
            layout,
            validator: UploadValidator::from_config(config),
            repo,
        })
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn max_upload_size(&self) -> u64 {
        self.validator.max_size_bytes()
    }

    /// Validate, store and record one upload.
    ///
    /// Validation failures return before anything touches the disk. Once the
    /// file is being written it is removed again unless the record insert
    /// succeeds; such failures surface as [`ServerError::UploadFailed`].
    pub async fn save<R>(
        &self,
        stream: &mut R,
        incoming: IncomingImage,
    ) -> Result<ImageRecord, ServerError>
    where
        R: AsyncRead + AsyncSeek + Unpin,
    {
        let size_bytes = self.validator.validate(stream, &incoming.content_type).await?;

        let category = incoming.category;
        let stored_filename = generate_filename(&incoming.original_filename, category);
        let storage_path = self.layout.file_path(category, &stored_filename)?;
        let public_url = StorageLayout::public_url(category, &stored_filename);

        let pending = PendingFile::new(storage_path);
        let written = write_stream(stream, pending.path())
            .await
            .map_err(|e| ServerError::UploadFailed(e.to_string()))?;
        if written != size_bytes {
            warn!(expected = size_bytes, written, "Upload length changed while copying");
        }

        let image = NewImage {
            public_url,
            category,
            original_filename: incoming.original_filename,
            stored_filename,
            storage_path: pending.path().to_string_lossy().into_owned(),
            content_type: incoming.content_type,
            size_bytes,
            uploaded_at: Utc::now(),
            metadata: incoming.metadata,
        };

        let record = self
            .with_repo(move |repo| {
                let id = repo.insert(&image)?;
                Ok(image.into_record(id))
            })
            .await?
            .map_err(|e| ServerError::UploadFailed(e.to_string()))?;
        pending.commit();

        info!(
            id = %record.id,
            category = %category,
            file = %record.stored_filename,
            size = size_bytes,
            "Image stored"
        );
        Ok(record)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<ImageRecord>, ServerError> {
        Ok(self.with_repo(move |repo| repo.get(id)).await??)
    }

    pub async fn list_by_category(
        &self,
        category: ImageCategory,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ImageRecord>, ServerError> {
        self.find(ImageFilter::Category(category), offset, limit).await
    }

    pub async fn list_all(&self, offset: u64, limit: u64) -> Result<Vec<ImageRecord>, ServerError> {
        self.find(ImageFilter::All, offset, limit).await
    }

    pub async fn count_by_category(&self, category: ImageCategory) -> Result<u64, ServerError> {
        self.count(ImageFilter::Category(category)).await
    }

    pub async fn count_all(&self) -> Result<u64, ServerError> {
        self.count(ImageFilter::All).await
    }

    /// Page of records matching `filter`, oldest first.
    async fn find(
        &self,
        filter: ImageFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<ImageRecord>, ServerError> {
        Ok(self
            .with_repo(move |repo| repo.find(filter, offset, limit))
            .await??)
    }

    async fn count(&self, filter: ImageFilter) -> Result<u64, ServerError> {
        Ok(self.with_repo(move |repo| repo.count(filter)).await??)
    }

    pub async fn stats(&self) -> Result<ImageStats, ServerError> {
        let mut by_category = Vec::with_capacity(ImageCategory::ALL.len());
        for category in ImageCategory::ALL {
            by_category.push((category, self.count_by_category(category).await?));
        }
        Ok(ImageStats {
            total: self.count_all().await?,
            by_category,
        })
    }

    /// Record and bytes of a stored image, for direct download.
    pub async fn read_file(&self, id: Uuid) -> Result<(ImageRecord, Vec<u8>), ServerError> {
        let record = self.require(id).await?;
        match fs::read(&record.storage_path).await {
            Ok(data) => Ok((record, data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ServerError::NotFound("Image file not found".to_string()))
            }
            Err(e) => Err(ServerError::Storage(format!(
                "Failed to read image {}: {}",
                id, e
            ))),
        }
    }

    /// Remove the stored file, then the record. A file that is already gone
    /// does not fail the delete; a missing record does.
    pub async fn delete(&self, id: Uuid) -> Result<(), ServerError> {
        let record = self.require(id).await?;

        match fs::remove_file(&record.storage_path).await {
            Ok(()) => debug!(id = %id, path = %record.storage_path, "Removed image file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(id = %id, path = %record.storage_path, "Image file already absent");
            }
            Err(e) => {
                return Err(ServerError::Storage(format!(
                    "Failed to delete image {}: {}",
                    id, e
                )));
            }
        }

        if !self.with_repo(move |repo| repo.delete(id)).await?? {
            debug!(id = %id, "Image record already removed");
        }

        info!(id = %id, "Image deleted");
        Ok(())
    }

    async fn require(&self, id: Uuid) -> Result<ImageRecord, ServerError> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ServerError::NotFound("Image not found".to_string()))
    }

    /// Run a record store call on the blocking pool. The outer error is a
    /// task that panicked or was cancelled; the inner one is the store's own.
    async fn with_repo<T, F>(&self, op: F) -> Result<Result<T, StoreError>, ServerError>
    where
        F: FnOnce(&dyn ImageRepository) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        tokio::task::spawn_blocking(move || op(repo.as_ref()))
            .await
            .map_err(|e| ServerError::Storage(format!("Record store task failed: {e}")))
    }
}

async fn write_stream<R>(stream: &mut R, path: &Path) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut file = fs::File::create(path).await?;
    let written = tokio::io::copy(stream, &mut file).await?;
    file.flush().await?;
    Ok(written)
}
