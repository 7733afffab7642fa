use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::FirebaseStorageConfig;
use crate::storage::{unique_filename, UploadBackend, UploadError, UploadedImage};

const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Uploads payment proofs to a GCS bucket (the one backing Firebase Storage)
/// through the JSON upload API. Authenticates as a service account: a signed
/// JWT assertion is traded for a short-lived access token, cached until close
/// to expiry. Objects are made publicly readable; access control is by URL
/// obscurity, as in the rest of the system.
pub struct FirebaseStorageBackend {
    config: FirebaseStorageConfig,
    http: reqwest::Client,
    token: RwLock<Option<CachedToken>>,
}

impl FirebaseStorageBackend {
    pub fn new(config: FirebaseStorageConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            token: RwLock::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, UploadError> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref() {
                // A minute of slack so we never present an expiring token.
                if token.expires_at - Utc::now() > Duration::minutes(1) {
                    return Ok(token.access_token.clone());
                }
            }
        }

        let now = Utc::now();
        let claims = AssertionClaims {
            iss: &self.config.service_account_email,
            scope: STORAGE_SCOPE,
            aud: &self.config.token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        let key = EncodingKey::from_rsa_pem(self.config.private_key.as_bytes())
            .map_err(|e| UploadError::Fatal(format!("Invalid service account key: {}", e)))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| UploadError::Fatal(format!("Failed to sign token assertion: {}", e)))?;

        let response: TokenResponse = self
            .http
            .post(&self.config.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", &assertion)])
            .send()
            .await
            .map_err(|e| UploadError::Retryable(format!("Token exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|e| UploadError::Retryable(format!("Token exchange rejected: {}", e)))?
            .json()
            .await
            .map_err(|e| UploadError::Retryable(format!("Invalid token response: {}", e)))?;

        let access_token = response.access_token.clone();
        let mut token = self.token.write().await;
        *token = Some(CachedToken {
            access_token: response.access_token,
            expires_at: now + Duration::seconds(response.expires_in),
        });

        Ok(access_token)
    }
}

#[async_trait]
impl UploadBackend for FirebaseStorageBackend {
    fn name(&self) -> &str {
        "firebase-storage"
    }

    async fn store(&self, image: &UploadedImage) -> Result<String, UploadError> {
        let access_token = self.access_token().await?;

        let filename = unique_filename("payment-proof", &image.owner_id, &image.original_name);
        let object_name = format!("payment-proofs/{}", filename);

        let upload_url = format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}&predefinedAcl=publicRead",
            self.config.bucket,
            urlencoding::encode(&object_name)
        );

        self.http
            .post(&upload_url)
            .bearer_auth(&access_token)
            .header(reqwest::header::CONTENT_TYPE, &image.content_type)
            .body(image.data.clone())
            .send()
            .await
            .map_err(|e| UploadError::Retryable(format!("Object upload failed: {}", e)))?
            .error_for_status()
            .map_err(|e| UploadError::Retryable(format!("Object upload rejected: {}", e)))?;

        Ok(format!(
            "https://storage.googleapis.com/{}/{}",
            self.config.bucket, object_name
        ))
    }
}
