use async_trait::async_trait;
use rand::RngCore;
use std::path::Path;
use std::sync::Arc;

use crate::error::{AppError, Result};

pub mod cloudinary;
pub mod firebase;
pub mod local;

pub use cloudinary::CloudinaryBackend;
pub use firebase::FirebaseStorageBackend;
pub use local::LocalDiskBackend;

/// Maximum accepted upload size (2 MiB), checked before any backend is tried.
pub const MAX_IMAGE_SIZE: usize = 2 * 1024 * 1024;

/// An image received from a client, held in memory until a backend accepts it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub original_name: String,
    pub owner_id: String,
}

/// Backend failure classification. `Retryable` hands the file to the next
/// backend in line; `Fatal` means no backend could accept it and aborts the
/// chain.
#[derive(Debug)]
pub enum UploadError {
    Retryable(String),
    Fatal(String),
}

#[async_trait]
pub trait UploadBackend: Send + Sync {
    fn name(&self) -> &str;
    /// Persist the image and return a publicly retrievable URL.
    async fn store(&self, image: &UploadedImage) -> std::result::Result<String, UploadError>;
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub url: String,
    pub backend: String,
}

/// Prioritized list of upload backends, tried in registration order.
pub struct UploadManager {
    backends: Vec<Arc<dyn UploadBackend>>,
}

impl UploadManager {
    pub fn new(backends: Vec<Arc<dyn UploadBackend>>) -> Self {
        Self { backends }
    }

    pub async fn store(&self, image: &UploadedImage) -> Result<StoredFile> {
        validate_image(&image.content_type, image.data.len())?;

        for backend in &self.backends {
            match backend.store(image).await {
                Ok(url) => {
                    tracing::info!(
                        backend = backend.name(),
                        owner = %image.owner_id,
                        "File uploaded"
                    );
                    return Ok(StoredFile {
                        url,
                        backend: backend.name().to_string(),
                    });
                }
                Err(UploadError::Retryable(msg)) => {
                    tracing::warn!(
                        backend = backend.name(),
                        "Upload failed, trying next backend: {}",
                        msg
                    );
                }
                Err(UploadError::Fatal(msg)) => {
                    return Err(AppError::Storage(msg));
                }
            }
        }

        Err(AppError::Storage("All upload backends failed".to_string()))
    }
}

/// Reject non-images and oversized payloads up front, before any network or
/// disk activity.
pub fn validate_image(content_type: &str, size: usize) -> Result<()> {
    if !content_type.starts_with("image/") {
        return Err(AppError::Validation(
            "Only image files are allowed.".to_string(),
        ));
    }
    if size > MAX_IMAGE_SIZE {
        return Err(AppError::Validation(
            "File size too large. Please upload an image smaller than 2MB.".to_string(),
        ));
    }
    Ok(())
}

/// Unique object name preserving the original extension, e.g.
/// `payment-proof-uid123-1700000000000-9f2a66d1.jpg`.
pub fn unique_filename(prefix: &str, owner_id: &str, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    let mut suffix = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut suffix);

    format!(
        "{}-{}-{}-{}{}",
        prefix,
        owner_id,
        chrono::Utc::now().timestamp_millis(),
        hex::encode(suffix),
        extension
    )
}
