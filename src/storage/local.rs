use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::storage::{unique_filename, UploadBackend, UploadError, UploadedImage};

/// Writes uploads to a subdirectory of the local uploads dir and serves them
/// back under `/uploads/...` via the static file route. Used directly for
/// doubt images and profile pictures, and as the dev fallback for payment
/// proofs when no cloud backend is configured.
pub struct LocalDiskBackend {
    uploads_dir: PathBuf,
    subdir: String,
    filename_prefix: String,
}

impl LocalDiskBackend {
    pub fn new(uploads_dir: &str, subdir: &str, filename_prefix: &str) -> Self {
        Self {
            uploads_dir: PathBuf::from(uploads_dir),
            subdir: subdir.to_string(),
            filename_prefix: filename_prefix.to_string(),
        }
    }
}

#[async_trait]
impl UploadBackend for LocalDiskBackend {
    fn name(&self) -> &str {
        "local-disk"
    }

    async fn store(&self, image: &UploadedImage) -> Result<String, UploadError> {
        let dir = self.uploads_dir.join(&self.subdir);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| UploadError::Retryable(format!("Failed to create uploads directory: {}", e)))?;

        let filename = unique_filename(&self.filename_prefix, &image.owner_id, &image.original_name);
        let file_path = dir.join(&filename);

        let mut file = fs::File::create(&file_path)
            .await
            .map_err(|e| UploadError::Retryable(format!("Failed to create file: {}", e)))?;

        file.write_all(&image.data)
            .await
            .map_err(|e| UploadError::Retryable(format!("Failed to write file: {}", e)))?;

        Ok(format!("/uploads/{}/{}", self.subdir, filename))
    }
}
