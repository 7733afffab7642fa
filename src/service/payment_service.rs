use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{CreatePaymentRequest, Payment},
    error::{AppError, Result},
    repository::{PaymentRepository, ProfileRepository},
    storage::{UploadManager, UploadedImage},
};

pub struct PaymentService {
    payment_repo: Arc<dyn PaymentRepository>,
    profile_repo: Arc<dyn ProfileRepository>,
    proof_uploads: Arc<UploadManager>,
    db_pool: SqlitePool,
}

impl PaymentService {
    pub fn new(
        payment_repo: Arc<dyn PaymentRepository>,
        profile_repo: Arc<dyn ProfileRepository>,
        proof_uploads: Arc<UploadManager>,
        db_pool: SqlitePool,
    ) -> Self {
        Self {
            payment_repo,
            profile_repo,
            proof_uploads,
            db_pool,
        }
    }

    /// Accept a payment proof: validate, persist the image through the upload
    /// chain, create a pending payment record and flag the owner profile.
    pub async fn submit_payment(
        &self,
        user_id: &str,
        plan: &str,
        amount: f64,
        payment_method: Option<String>,
        proof: UploadedImage,
    ) -> Result<Payment> {
        if plan.is_empty() || !(amount > 0.0) {
            return Err(AppError::Validation(
                "Plan and amount are required".to_string(),
            ));
        }

        // Image validation happens inside the manager, before any backend is
        // touched; a bad file never reaches the payment table.
        let stored = self.proof_uploads.store(&proof).await?;

        let payment = self
            .payment_repo
            .create(CreatePaymentRequest {
                user_id: user_id.to_string(),
                plan: plan.to_string(),
                amount,
                payment_method: payment_method.unwrap_or_else(|| "UPI".to_string()),
                proof_url: stored.url,
            })
            .await?;

        self.profile_repo
            .set_payment_proof_uploaded(user_id, payment.id)
            .await?;

        Ok(payment)
    }

    /// Approve or reject a payment, flipping the owner's subscription flags in
    /// the same transaction. An observer must never see the payment resolved
    /// while the owner still carries the old flags, or the other way round.
    ///
    /// If the owner profile has been deleted since the upload, the payment is
    /// still resolved; the profile update is skipped with a warning. Every
    /// write sets absolute values, so re-invoking after a failure is safe.
    pub async fn resolve_payment(&self, payment_id: Uuid, approve: bool) -> Result<Payment> {
        let payment = self
            .payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let now = Utc::now().naive_utc();
        let status = if approve { "approved" } else { "rejected" };

        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            UPDATE payments
            SET approved = ?,
                status = ?,
                approved_at = ?,
                rejected_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(approve)
        .bind(status)
        .bind(approve.then_some(now))
        .bind((!approve).then_some(now))
        .bind(now)
        .bind(payment_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let owner_exists = sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE id = ?")
            .bind(&payment.user_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .is_some();

        if owner_exists {
            let subscription_status = if approve { "active" } else { "inactive" };
            sqlx::query(
                r#"
                UPDATE users
                SET subscription_status = ?,
                    admin_approved = ?,
                    doubt_access = ?,
                    payment_approved_at = COALESCE(?, payment_approved_at),
                    payment_rejected_at = COALESCE(?, payment_rejected_at),
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(subscription_status)
            .bind(approve)
            .bind(approve)
            .bind(approve.then_some(now))
            .bind((!approve).then_some(now))
            .bind(now)
            .bind(&payment.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        } else {
            tracing::warn!(
                payment_id = %payment_id,
                user_id = %payment.user_id,
                "Resolving payment for a deleted user; profile update skipped"
            );
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(payment_id = %payment_id, status, "Payment resolved");

        self.payment_repo
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve resolved payment".to_string()))
    }

    pub async fn payment_history(&self, user_id: &str) -> Result<Vec<Payment>> {
        self.payment_repo.find_by_user(user_id).await
    }
}
