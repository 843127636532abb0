use std::io::SeekFrom;

use prasad_shared::constants::IMAGE_MIME_PREFIX;
use tokio::io::{AsyncSeek, AsyncSeekExt};

use crate::config::UploadConfig;
use crate::error::ServerError;

/// Content-type and size checks applied before anything is written.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    allowed_content_types: Vec<String>,
    max_size_bytes: u64,
}

impl UploadValidator {
    pub fn new(allowed_content_types: Vec<String>, max_size_bytes: u64) -> Self {
        Self {
            allowed_content_types,
            max_size_bytes,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(config.allowed_content_types.clone(), config.max_size_bytes)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn check_content_type(&self, content_type: &str) -> Result<(), ServerError> {
        if !content_type.starts_with(IMAGE_MIME_PREFIX) {
            return Err(ServerError::InvalidContentType(
                "Only image files are allowed".to_string(),
            ));
        }
        if !self.allowed_content_types.iter().any(|t| t == content_type) {
            return Err(ServerError::InvalidContentType(format!(
                "Allowed formats: {}",
                self.allowed_content_types.join(", ")
            )));
        }
        Ok(())
    }

    /// Check `content_type`, then measure the stream by seeking to its end.
    /// The stream is rewound to offset 0 before returning the size.
    pub async fn validate<R>(&self, stream: &mut R, content_type: &str) -> Result<u64, ServerError>
    where
        R: AsyncSeek + Unpin,
    {
        self.check_content_type(content_type)?;

        let size = stream
            .seek(SeekFrom::End(0))
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to measure upload: {e}")))?;
        stream
            .rewind()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to rewind upload: {e}")))?;

        if size > self.max_size_bytes {
            return Err(ServerError::FileTooLarge {
                size: Some(size),
                max: self.max_size_bytes,
            });
        }

        Ok(size)
    }
}
