//! # prasad-store
//!
//! Record store for uploaded images, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` with typed CRUD helpers for the `images` table, and
//! the [`ImageRepository`] trait the server programs against.

pub mod database;
pub mod images;
pub mod migrations;
pub mod models;
pub mod repository;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use repository::{ImageRepository, SqliteImageRepository};
