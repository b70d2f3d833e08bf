//! # parley-storage
//!
//! Object storage for images attached to messages and profile pictures.
//! Supports the local filesystem and S3-compatible object stores.

pub mod manager;
pub mod providers;

pub use manager::{ImageUpload, StorageManager};
