use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student (or admin) profile. Keyed by the identity provider's subject id
/// rather than a locally generated uuid, so one record per authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub auth_method: AuthMethod,
    pub subscription_status: SubscriptionStatus,
    pub doubt_access: bool,
    pub admin_approved: bool,
    pub payment_proof_uploaded: bool,
    pub profile_picture_url: Option<String>,
    pub last_payment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Email,
    Phone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone)]
pub struct CreateProfileRequest {
    pub subject: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

impl CreateProfileRequest {
    /// Email fallback for phone-only signups. The provider hands us no email
    /// for OTP users, so a placeholder keeps the column non-null and unique
    /// enough for the admin console.
    pub fn effective_email(&self) -> String {
        match &self.email {
            Some(email) if !email.is_empty() => email.clone(),
            _ => format!("{}@phone.auth", self.phone.as_deref().unwrap_or("")),
        }
    }
}
