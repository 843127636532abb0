/// Application name
pub const APP_NAME: &str = "Prasad";

/// URL prefix under which the upload root is served
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Default upload root directory (relative to the working directory)
pub const DEFAULT_UPLOAD_ROOT: &str = "uploads";

/// Every accepted content type must start with this prefix
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Content types accepted for upload
pub const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Maximum upload size in bytes (5 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Page size used when a listing request does not give one
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Largest page size a listing request may ask for
pub const MAX_PAGE_LIMIT: u64 = 100;
