use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::{
    auth::{IdentityClaims, TokenVerifier},
    config::FirebaseConfig,
    error::{AppError, Result},
};

/// How long fetched signing keys are trusted before a refetch. Google rotates
/// the secure-token keys on the order of days, so an hour is comfortably
/// inside the rotation window.
const KEY_CACHE_TTL_HOURS: i64 = 1;

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize, Clone)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
    phone_number: Option<String>,
}

struct KeyCache {
    keys: HashMap<String, Jwk>,
    fetched_at: DateTime<Utc>,
}

/// Verifies Firebase ID tokens: RS256 JWTs signed by Google's secure-token
/// service, with the Firebase project id as audience. Signing keys are pulled
/// from the published JWK endpoint and cached; an unknown `kid` forces a
/// refetch before the token is rejected.
pub struct FirebaseTokenVerifier {
    config: FirebaseConfig,
    http: reqwest::Client,
    cache: RwLock<Option<KeyCache>>,
}

impl FirebaseTokenVerifier {
    pub fn new(config: FirebaseConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            cache: RwLock::new(None),
        }
    }

    async fn signing_key(&self, kid: &str) -> Result<Jwk> {
        {
            let cache = self.cache.read().await;
            if let Some(cache) = cache.as_ref() {
                let fresh = Utc::now() - cache.fetched_at < Duration::hours(KEY_CACHE_TTL_HOURS);
                if fresh {
                    if let Some(jwk) = cache.keys.get(kid) {
                        return Ok(jwk.clone());
                    }
                }
            }
        }

        self.refresh_keys().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|c| c.keys.get(kid).cloned())
            .ok_or(AppError::Unauthenticated)
    }

    async fn refresh_keys(&self) -> Result<()> {
        let jwks: JwkSet = self
            .http
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch signing keys: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Internal(format!("Signing key endpoint error: {}", e)))?
            .json()
            .await
            .map_err(|e| AppError::Internal(format!("Invalid signing key response: {}", e)))?;

        let keys = jwks
            .keys
            .into_iter()
            .map(|jwk| (jwk.kid.clone(), jwk))
            .collect::<HashMap<_, _>>();

        tracing::debug!("Refreshed {} token signing keys", keys.len());

        let mut cache = self.cache.write().await;
        *cache = Some(KeyCache {
            keys,
            fetched_at: Utc::now(),
        });

        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims> {
        let header = decode_header(token).map_err(|_| AppError::Unauthenticated)?;
        let kid = header.kid.ok_or(AppError::Unauthenticated)?;

        let jwk = self.signing_key(&kid).await?;
        let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| AppError::Internal(format!("Bad signing key material: {}", e)))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.config.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.config.project_id
        )]);

        let decoded = decode::<FirebaseClaims>(token, &key, &validation).map_err(|e| {
            tracing::debug!("Token rejected: {}", e);
            AppError::Unauthenticated
        })?;

        Ok(IdentityClaims {
            subject: decoded.claims.sub,
            email: decoded.claims.email,
            phone_number: decoded.claims.phone_number,
        })
    }
}
