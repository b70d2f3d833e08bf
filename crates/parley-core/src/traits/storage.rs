//! Object storage trait for uploaded images.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Trait for object storage backends holding uploaded images.
///
/// Implementations exist for the local filesystem and S3. The trait is
/// defined here in `parley-core` and implemented in `parley-storage`.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Store `data` under `key` and return the object's public URL.
    async fn put_object(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<String>;

    /// Public URL an object stored under `key` is reachable at.
    fn public_url(&self, key: &str) -> String;
}
