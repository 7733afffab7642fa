use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreatePaymentRequest, Payment, PaymentStatus, PaymentWithOwner},
    error::{AppError, Result},
    repository::PaymentRepository,
};

#[derive(FromRow)]
struct PaymentRow {
    id: String,
    user_id: String,
    plan: String,
    amount: f64,
    payment_method: String,
    proof_url: String,
    status: String,
    approved: Option<bool>,
    approved_at: Option<NaiveDateTime>,
    rejected_at: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct PaymentWithOwnerRow {
    #[sqlx(flatten)]
    payment: PaymentRow,
    user_name: Option<String>,
    user_email: Option<String>,
    user_phone: Option<String>,
}

pub struct SqlitePaymentRepository {
    pool: SqlitePool,
}

impl SqlitePaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_payment(row: PaymentRow) -> Result<Payment> {
        Ok(Payment {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: row.user_id,
            plan: row.plan,
            amount: row.amount,
            payment_method: row.payment_method,
            proof_url: row.proof_url,
            status: parse_payment_status(&row.status)?,
            approved: row.approved,
            approved_at: row.approved_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            rejected_at: row.rejected_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

pub(crate) fn parse_payment_status(s: &str) -> Result<PaymentStatus> {
    match s {
        "pending" => Ok(PaymentStatus::Pending),
        "approved" => Ok(PaymentStatus::Approved),
        "rejected" => Ok(PaymentStatus::Rejected),
        _ => Err(AppError::Database(format!("Invalid payment status: {}", s))),
    }
}

#[async_trait]
impl PaymentRepository for SqlitePaymentRepository {
    async fn create(&self, request: CreatePaymentRequest) -> Result<Payment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, plan, amount, payment_method, proof_url,
                status, approved, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 'pending', NULL, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.user_id)
        .bind(&request.plan)
        .bind(request.amount)
        .bind(&request.payment_method)
        .bind(&request.proof_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created payment".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan, amount, payment_method, proof_url,
                   status, approved, approved_at, rejected_at, created_at, updated_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_payment(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, user_id, plan, amount, payment_method, proof_url,
                   status, approved, approved_at, rejected_at, created_at, updated_at
            FROM payments
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_payment).collect()
    }

    async fn list_with_owner(&self) -> Result<Vec<PaymentWithOwner>> {
        // One join instead of a per-payment owner lookup.
        let rows = sqlx::query_as::<_, PaymentWithOwnerRow>(
            r#"
            SELECT p.id, p.user_id, p.plan, p.amount, p.payment_method, p.proof_url,
                   p.status, p.approved, p.approved_at, p.rejected_at,
                   p.created_at, p.updated_at,
                   u.name AS user_name, u.email AS user_email, u.phone AS user_phone
            FROM payments p
            LEFT JOIN users u ON u.id = p.user_id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                Ok(PaymentWithOwner {
                    payment: Self::row_to_payment(r.payment)?,
                    user_name: r.user_name,
                    user_email: r.user_email,
                    user_phone: r.user_phone,
                })
            })
            .collect()
    }
}
