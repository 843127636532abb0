use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use prasad_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    InvalidContentType(String),

    /// `size` is unknown when the request body was cut off before the file
    /// could be measured.
    #[error("File size exceeds maximum allowed size of {max} bytes")]
    FileTooLarge { size: Option<u64>, max: u64 },

    #[error("{0}")]
    NotFound(String),

    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::InvalidContentType(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::FileTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ServerError::UploadFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            ServerError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage error".to_string())
            }
            ServerError::Store(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = serde_json::json!({
            "detail": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
