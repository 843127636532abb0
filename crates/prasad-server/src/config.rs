//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use prasad_shared::constants::{
    ALLOWED_IMAGE_TYPES, DEFAULT_HTTP_PORT, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_UPLOAD_ROOT,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8000`
    pub http_addr: SocketAddr,

    /// SQLite file holding image records.
    /// Env: `DATABASE_PATH`
    /// Default: `./prasad.db`
    pub database_path: PathBuf,

    pub upload: UploadConfig,
}

/// Everything the image service needs to accept and place uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConfig {
    /// Root directory; one sub-directory per image category lives below it.
    /// Env: `UPLOAD_ROOT`
    /// Default: `uploads`
    pub root: PathBuf,

    /// Accepted content types. Each must also start with `image/`.
    /// Env: `ALLOWED_IMAGE_TYPES` (comma separated)
    pub allowed_content_types: Vec<String>,

    /// Largest accepted upload in bytes.
    /// Env: `MAX_UPLOAD_SIZE`
    /// Default: 5 MiB
    pub max_size_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_UPLOAD_ROOT),
            allowed_content_types: ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()).collect(),
            max_size_bytes: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl UploadConfig {
    /// Upload configuration rooted at `root` with default limits.
    #[cfg(test)]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], DEFAULT_HTTP_PORT).into(),
            database_path: PathBuf::from("./prasad.db"),
            upload: UploadConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|v| !v.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("UPLOAD_ROOT").filter(|v| !v.trim().is_empty()) {
            config.upload.root = PathBuf::from(path);
        }

        if let Some(val) = lookup("MAX_UPLOAD_SIZE") {
            match val.trim().parse::<u64>() {
                Ok(n) if n > 0 => config.upload.max_size_bytes = n,
                _ => tracing::warn!(value = %val, "Invalid MAX_UPLOAD_SIZE, using default"),
            }
        }

        if let Some(val) = lookup("ALLOWED_IMAGE_TYPES") {
            let types = parse_content_types(&val);
            if types.is_empty() {
                tracing::warn!(value = %val, "Empty ALLOWED_IMAGE_TYPES, using default");
            } else {
                config.upload.allowed_content_types = types;
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

fn parse_content_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
