use async_trait::async_trait;
use sha2::{Digest, Sha256};
use serde::Deserialize;
use std::path::Path;

use crate::config::CloudinaryConfig;
use crate::storage::{unique_filename, UploadBackend, UploadError, UploadedImage};

const UPLOAD_FOLDER: &str = "learnly/payment-proofs";

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Fallback image host. Performs a signed upload to the Cloudinary REST API;
/// the signature is the SHA-256 digest of the sorted request parameters plus
/// the API secret.
pub struct CloudinaryBackend {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl CloudinaryBackend {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn sign(&self, params: &[(&str, &str)]) -> String {
        // Parameters must be concatenated in alphabetical order, excluding
        // file, api_key and signature_algorithm.
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by_key(|(k, _)| *k);

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl UploadBackend for CloudinaryBackend {
    fn name(&self) -> &str {
        "cloudinary"
    }

    async fn store(&self, image: &UploadedImage) -> Result<String, UploadError> {
        let filename = unique_filename("payment-proof", &image.owner_id, &image.original_name);
        // public_id carries no extension; Cloudinary derives the format.
        let stem = Path::new(&filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&filename)
            .to_string();

        let public_id = format!("payment-proofs/{}", stem);
        let tags = format!("payment-proof,{}", image.owner_id);
        let timestamp = chrono::Utc::now().timestamp().to_string();

        let signature = self.sign(&[
            ("folder", UPLOAD_FOLDER),
            ("public_id", &public_id),
            ("tags", &tags),
            ("timestamp", &timestamp),
        ]);

        let file_part = reqwest::multipart::Part::bytes(image.data.clone())
            .file_name(filename)
            .mime_str(&image.content_type)
            .map_err(|e| UploadError::Fatal(format!("Invalid content type: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id)
            .text("folder", UPLOAD_FOLDER.to_string())
            .text("tags", tags)
            .text("signature", signature)
            .text("signature_algorithm", "sha256".to_string());

        let upload_url = format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        );

        let response: UploadResponse = self
            .http
            .post(&upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Retryable(format!("Upload request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| UploadError::Retryable(format!("Upload rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| UploadError::Retryable(format!("Invalid upload response: {}", e)))?;

        Ok(response.secure_url)
    }
}
