use std::sync::Arc;

use crate::{
    auth::IdentityClaims,
    domain::{CreateProfileRequest, UserProfile, UserRole},
    error::{AppError, Result},
    repository::ProfileRepository,
    storage::{UploadManager, UploadedImage},
};

pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
    image_uploads: Arc<UploadManager>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>, image_uploads: Arc<UploadManager>) -> Self {
        Self {
            repo,
            image_uploads,
        }
    }

    /// Create (or re-create) the profile for a freshly authenticated subject.
    /// The phone number from the token wins over the one in the request body,
    /// since the provider has actually verified it.
    pub async fn create_profile(
        &self,
        claims: &IdentityClaims,
        name: Option<String>,
        phone: Option<String>,
        user_type: Option<String>,
    ) -> Result<UserProfile> {
        let role = match user_type.as_deref() {
            Some("admin") => Some(UserRole::Admin),
            _ => Some(UserRole::Student),
        };

        let request = CreateProfileRequest {
            subject: claims.subject.clone(),
            name,
            email: claims.email.clone(),
            phone: claims.phone_number.clone().or(phone),
            role,
        };

        self.repo.upsert(request).await
    }

    pub async fn get_profile(&self, subject: &str) -> Result<UserProfile> {
        self.repo
            .find_by_id(subject)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_phone(&self, subject: &str, phone: &str) -> Result<UserProfile> {
        if phone.is_empty() {
            return Err(AppError::Validation("Phone number is required".to_string()));
        }
        if !is_valid_phone(phone) {
            return Err(AppError::Validation(
                "Invalid phone number format".to_string(),
            ));
        }
        self.repo.update_phone(subject, phone).await
    }

    pub async fn set_doubt_access(&self, subject: &str, enabled: bool) -> Result<UserProfile> {
        self.repo.set_doubt_access(subject, enabled).await
    }

    pub async fn set_profile_picture(
        &self,
        subject: &str,
        picture: UploadedImage,
    ) -> Result<UserProfile> {
        let stored = self.image_uploads.store(&picture).await?;
        self.repo.set_profile_picture(subject, &stored.url).await
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.repo.list().await
    }
}

/// E.164-ish: `+`, a leading non-zero digit, 2 to 15 digits total.
fn is_valid_phone(phone: &str) -> bool {
    let Some(digits) = phone.strip_prefix('+') else {
        return false;
    };
    (2..=15).contains(&digits.len())
        && !digits.starts_with('0')
        && digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::is_valid_phone;

    #[test]
    fn accepts_e164_numbers() {
        assert!(is_valid_phone("+14155552671"));
        assert!(is_valid_phone("+919876543210"));
        assert!(is_valid_phone("+12"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        assert!(!is_valid_phone("14155552671")); // missing +
        assert!(!is_valid_phone("+0123456789")); // leading zero
        assert!(!is_valid_phone("+1")); // too short
        assert!(!is_valid_phone("+1234567890123456")); // too long
        assert!(!is_valid_phone("+1415abc2671"));
        assert!(!is_valid_phone(""));
    }
}
