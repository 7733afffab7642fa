use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One payment-proof submission awaiting (or past) admin review.
///
/// `approved` is `None` exactly while `status` is `Pending`; once resolved,
/// exactly one of `approved_at`/`rejected_at` carries the decision time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub user_id: String,
    pub plan: String,
    pub amount: f64,
    pub payment_method: String,
    pub proof_url: String,
    pub status: PaymentStatus,
    pub approved: Option<bool>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    pub user_id: String,
    pub plan: String,
    pub amount: f64,
    pub payment_method: String,
    pub proof_url: String,
}

/// Payment enriched with owner contact info for the admin console, so the
/// client does not need a second lookup per row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithOwner {
    #[serde(flatten)]
    pub payment: Payment,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
}
