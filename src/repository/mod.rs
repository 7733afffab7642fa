use async_trait::async_trait;
use uuid::Uuid;
use crate::domain::*;
use crate::error::Result;

pub mod profile_repository;
pub mod payment_repository;
pub mod doubt_repository;

pub use profile_repository::SqliteProfileRepository;
pub use payment_repository::SqlitePaymentRepository;
pub use doubt_repository::SqliteDoubtRepository;

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Create or replace the profile for a subject. Re-registering resets the
    /// approval flags to their initial state, matching the behavior of a
    /// whole-document write in the original store.
    async fn upsert(&self, request: CreateProfileRequest) -> Result<UserProfile>;
    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>>;
    async fn list(&self) -> Result<Vec<UserProfile>>;
    async fn update_phone(&self, id: &str, phone: &str) -> Result<UserProfile>;
    /// Unconditional flag flip. Deliberately not coupled to subscription
    /// status: the admin override is allowed to grant access to an inactive
    /// user, even though payment approval ties the two together.
    async fn set_doubt_access(&self, id: &str, enabled: bool) -> Result<UserProfile>;
    async fn set_payment_proof_uploaded(&self, id: &str, payment_id: Uuid) -> Result<()>;
    async fn set_profile_picture(&self, id: &str, url: &str) -> Result<UserProfile>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create(&self, request: CreatePaymentRequest) -> Result<Payment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>>;
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Payment>>;
    async fn list_with_owner(&self) -> Result<Vec<PaymentWithOwner>>;
}

#[async_trait]
pub trait DoubtRepository: Send + Sync {
    async fn create(&self, request: CreateDoubtRequest) -> Result<Doubt>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doubt>>;
    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Doubt>>;
    async fn list_with_owner(&self) -> Result<Vec<DoubtWithOwner>>;
    async fn respond(&self, id: Uuid, response: &str) -> Result<Doubt>;
    async fn resolve(&self, id: Uuid) -> Result<Doubt>;
}
