use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{AppError, Result};

pub mod firebase;

pub use firebase::FirebaseTokenVerifier;

/// Decoded identity of an authenticated caller, as attested by the identity
/// provider. Phone-only signups have no email and vice versa.
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    pub subject: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

/// Stateless check of a bearer credential. Implementations must fail with
/// `Unauthenticated` for anything the provider would not accept.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<IdentityClaims>;
}

/// Verifier backed by a fixed token map. Used by the integration tests and
/// handy for local development without provider credentials.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, IdentityClaims>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, claims: IdentityClaims) {
        self.tokens.insert(token.into(), claims);
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<IdentityClaims> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AppError::Unauthenticated)
    }
}
