//! # prasad-shared
//!
//! Vocabulary shared by the record store and the HTTP server: image
//! categories, metadata maps, and upload limits.

pub mod constants;
pub mod error;
pub mod types;

pub use error::SharedError;
pub use types::{ImageCategory, ImageMetadata};
