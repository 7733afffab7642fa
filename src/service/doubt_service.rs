use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{CreateDoubtRequest, Doubt, DoubtWithOwner, SubscriptionStatus},
    error::{AppError, Result},
    repository::{DoubtRepository, ProfileRepository},
    storage::{validate_image, UploadManager, UploadedImage},
};

pub struct DoubtService {
    repo: Arc<dyn DoubtRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    image_uploads: Arc<UploadManager>,
}

impl DoubtService {
    pub fn new(
        repo: Arc<dyn DoubtRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        image_uploads: Arc<UploadManager>,
    ) -> Self {
        Self {
            repo,
            profile_repo,
            image_uploads,
        }
    }

    /// Gated on the owner having doubt access AND an active subscription.
    /// The admin toggle can set `doubt_access` on its own, so both flags are
    /// checked here rather than trusting either one alone.
    pub async fn submit_doubt(
        &self,
        user_id: &str,
        subject: &str,
        question: &str,
        image: Option<UploadedImage>,
    ) -> Result<Doubt> {
        if subject.is_empty() || question.is_empty() {
            return Err(AppError::Validation(
                "Subject and question are required".to_string(),
            ));
        }

        // Reject bad attachments before touching any store.
        if let Some(image) = &image {
            validate_image(&image.content_type, image.data.len())?;
        }

        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !profile.doubt_access || profile.subscription_status != SubscriptionStatus::Active {
            return Err(AppError::Forbidden(
                "Doubt access not enabled. Please complete subscription and wait for admin approval."
                    .to_string(),
            ));
        }

        let image_url = match image {
            Some(image) => Some(self.image_uploads.store(&image).await?.url),
            None => None,
        };

        self.repo
            .create(CreateDoubtRequest {
                user_id: user_id.to_string(),
                subject: subject.to_string(),
                question: question.to_string(),
                image_url,
            })
            .await
    }

    pub async fn my_doubts(&self, user_id: &str) -> Result<Vec<Doubt>> {
        self.repo.find_by_user(user_id).await
    }

    pub async fn list_all(&self) -> Result<Vec<DoubtWithOwner>> {
        self.repo.list_with_owner().await
    }

    pub async fn respond(&self, doubt_id: Uuid, response: &str) -> Result<Doubt> {
        if response.trim().is_empty() {
            return Err(AppError::Validation(
                "Doubt ID and response are required".to_string(),
            ));
        }
        self.repo.respond(doubt_id, response).await
    }

    /// Terminal state; resolving an already-resolved doubt is a no-op.
    pub async fn resolve(&self, doubt_id: Uuid) -> Result<Doubt> {
        self.repo.resolve(doubt_id).await
    }
}
