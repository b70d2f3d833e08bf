//! Storage manager: owns the configured provider and names uploaded objects.

use std::sync::Arc;

use bytes::Bytes;
use tracing::info;

use parley_core::config::StorageConfig;
use parley_core::error::AppError;
use parley_core::result::AppResult;
use parley_core::traits::storage::ObjectStore;
use parley_core::types::id::UserId;

use crate::providers::LocalObjectStore;

/// An image received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-side file name; only its extension is kept.
    pub file_name: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file contents.
    pub data: Bytes,
}

impl ImageUpload {
    /// Size of the upload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Entry point for image uploads.
#[derive(Debug, Clone)]
pub struct StorageManager {
    provider: Arc<dyn ObjectStore>,
    max_image_size_bytes: u64,
}

impl StorageManager {
    /// Wrap an already constructed provider.
    pub fn new(provider: Arc<dyn ObjectStore>, max_image_size_bytes: u64) -> Self {
        Self {
            provider,
            max_image_size_bytes,
        }
    }

    /// Build the provider selected by `storage.provider`.
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let provider: Arc<dyn ObjectStore> = match config.provider.as_str() {
            "local" => Arc::new(
                LocalObjectStore::new(&config.local.root_path, &config.local.public_base_url)
                    .await?,
            ),
            #[cfg(feature = "s3")]
            "s3" => Arc::new(crate::providers::S3ObjectStore::new(&config.s3).await?),
            other => {
                return Err(AppError::configuration(format!(
                    "Unsupported storage provider '{other}'"
                )));
            }
        };

        info!(provider = provider.provider_type(), "Object storage ready");
        Ok(Self::new(provider, config.max_image_size_bytes))
    }

    /// The active provider.
    pub fn provider(&self) -> &Arc<dyn ObjectStore> {
        &self.provider
    }

    /// Largest accepted image in bytes.
    pub fn max_image_size_bytes(&self) -> u64 {
        self.max_image_size_bytes
    }

    /// Upload an image owned by `owner` and return its public URL.
    pub async fn store_image(&self, owner: UserId, upload: ImageUpload) -> AppResult<String> {
        if upload.size() > self.max_image_size_bytes {
            return Err(AppError::validation(format!(
                "Image must be less than {}MB",
                self.max_image_size_bytes / (1024 * 1024)
            )));
        }

        let key = object_key(owner, chrono::Utc::now().timestamp_millis(), &upload.file_name);
        self.provider
            .put_object(&key, upload.data, &upload.content_type)
            .await
    }

    /// Provider health.
    pub async fn health_check(&self) -> bool {
        self.provider.health_check().await.unwrap_or(false)
    }
}

/// `<owner>-<unix millis>.<ext>`, with the extension taken from the client file name.
pub fn object_key(owner: UserId, millis: i64, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string());
    format!("{owner}-{millis}.{ext}")
}
