//! Domain model structs persisted in the `images` table.

use chrono::{DateTime, Utc};
use prasad_shared::{ImageCategory, ImageMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Image
// ---------------------------------------------------------------------------

/// An image about to be inserted. The store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewImage {
    /// Path under which the stored file is externally reachable.
    pub public_url: String,
    pub category: ImageCategory,
    /// Name as submitted by the client.
    pub original_filename: String,
    /// Generated unique on-disk name.
    pub stored_filename: String,
    /// Where the bytes live on disk.
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: ImageMetadata,
}

impl NewImage {
    pub fn into_record(self, id: Uuid) -> ImageRecord {
        ImageRecord {
            id,
            public_url: self.public_url,
            category: self.category,
            original_filename: self.original_filename,
            stored_filename: self.stored_filename,
            storage_path: self.storage_path,
            content_type: self.content_type,
            size_bytes: self.size_bytes,
            uploaded_at: self.uploaded_at,
            metadata: self.metadata,
        }
    }
}

/// One stored uploaded file. Records are never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImageRecord {
    pub id: Uuid,
    pub public_url: String,
    pub category: ImageCategory,
    pub original_filename: String,
    pub stored_filename: String,
    pub storage_path: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub metadata: ImageMetadata,
}

/// Which records a listing or count covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageFilter {
    #[default]
    All,
    Category(ImageCategory),
}

impl ImageFilter {
    pub fn category(&self) -> Option<ImageCategory> {
        match self {
            Self::All => None,
            Self::Category(category) => Some(*category),
        }
    }
}
