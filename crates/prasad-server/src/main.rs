//! # prasad-server
//!
//! HTTP backend for the Prasad drone-service marketplace image uploads.
//!
//! This binary provides:
//! - **Image upload** with content-type and size checks, stored under one
//!   directory per image category
//! - **Image records** in SQLite, listed, counted and deleted through the REST
//!   API (axum)
//! - **Static serving** of the upload root under `/uploads`

mod api;
mod config;
mod error;
mod filename;
mod images;
mod layout;
mod pending;
mod validate;

use std::sync::Arc;

use prasad_store::SqliteImageRepository;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::images::ImageService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,prasad_server=debug")),
        )
        .init();

    info!("Starting Prasad server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Record store (runs migrations on open)
    let repo = Arc::new(SqliteImageRepository::open_at(&config.database_path)?);

    // Image service (creates the upload directories if missing)
    let images = Arc::new(ImageService::new(&config.upload, repo).await?);

    let app_state = AppState { images };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
