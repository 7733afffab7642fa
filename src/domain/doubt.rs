use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student question. `admin_response` is only ever set alongside a move out
/// of `Pending`; `Resolved` is terminal (re-resolving is a no-op).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doubt {
    pub id: Uuid,
    pub user_id: String,
    pub subject: String,
    pub question: String,
    pub image_url: Option<String>,
    pub status: DoubtStatus,
    pub admin_response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Nullable: rows imported from the legacy store may lack a timestamp
    /// and must sort after every dated row.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DoubtStatus {
    Pending,
    Responded,
    Resolved,
}

#[derive(Debug, Clone)]
pub struct CreateDoubtRequest {
    pub user_id: String,
    pub subject: String,
    pub question: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoubtWithOwner {
    #[serde(flatten)]
    pub doubt: Doubt,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}
