use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{CreateDoubtRequest, Doubt, DoubtStatus, DoubtWithOwner},
    error::{AppError, Result},
    repository::DoubtRepository,
};

#[derive(FromRow)]
struct DoubtRow {
    id: String,
    user_id: String,
    subject: String,
    question: String,
    image_url: Option<String>,
    status: String,
    admin_response: Option<String>,
    responded_at: Option<NaiveDateTime>,
    resolved_at: Option<NaiveDateTime>,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

#[derive(FromRow)]
struct DoubtWithOwnerRow {
    #[sqlx(flatten)]
    doubt: DoubtRow,
    user_name: Option<String>,
    user_email: Option<String>,
}

pub struct SqliteDoubtRepository {
    pool: SqlitePool,
}

impl SqliteDoubtRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_doubt(row: DoubtRow) -> Result<Doubt> {
        Ok(Doubt {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            user_id: row.user_id,
            subject: row.subject,
            question: row.question,
            image_url: row.image_url,
            status: Self::parse_status(&row.status)?,
            admin_response: row.admin_response,
            responded_at: row.responded_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            resolved_at: row.resolved_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            created_at: row.created_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
            updated_at: row.updated_at.map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc)),
        })
    }

    fn parse_status(s: &str) -> Result<DoubtStatus> {
        match s {
            "pending" => Ok(DoubtStatus::Pending),
            "responded" => Ok(DoubtStatus::Responded),
            "resolved" => Ok(DoubtStatus::Resolved),
            _ => Err(AppError::Database(format!("Invalid doubt status: {}", s))),
        }
    }

    async fn fetch_required(&self, id: Uuid) -> Result<Doubt> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Doubt not found".to_string()))
    }
}

#[async_trait]
impl DoubtRepository for SqliteDoubtRepository {
    async fn create(&self, request: CreateDoubtRequest) -> Result<Doubt> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO doubts (
                id, user_id, subject, question, image_url,
                status, admin_response, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 'pending', NULL, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.user_id)
        .bind(&request.subject)
        .bind(&request.question)
        .bind(&request.image_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(id).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Doubt>> {
        let row = sqlx::query_as::<_, DoubtRow>(
            r#"
            SELECT id, user_id, subject, question, image_url, status,
                   admin_response, responded_at, resolved_at, created_at, updated_at
            FROM doubts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_doubt(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Vec<Doubt>> {
        // Undated rows sort after every dated one, newest first otherwise.
        let rows = sqlx::query_as::<_, DoubtRow>(
            r#"
            SELECT id, user_id, subject, question, image_url, status,
                   admin_response, responded_at, resolved_at, created_at, updated_at
            FROM doubts
            WHERE user_id = ?
            ORDER BY created_at IS NULL, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_doubt).collect()
    }

    async fn list_with_owner(&self) -> Result<Vec<DoubtWithOwner>> {
        let rows = sqlx::query_as::<_, DoubtWithOwnerRow>(
            r#"
            SELECT d.id, d.user_id, d.subject, d.question, d.image_url, d.status,
                   d.admin_response, d.responded_at, d.resolved_at,
                   d.created_at, d.updated_at,
                   u.name AS user_name, u.email AS user_email
            FROM doubts d
            LEFT JOIN users u ON u.id = d.user_id
            ORDER BY d.created_at IS NULL, d.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|r| {
                Ok(DoubtWithOwner {
                    doubt: Self::row_to_doubt(r.doubt)?,
                    user_name: r.user_name,
                    user_email: r.user_email,
                })
            })
            .collect()
    }

    async fn respond(&self, id: Uuid, response: &str) -> Result<Doubt> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query(
            r#"
            UPDATE doubts
            SET admin_response = ?,
                responded_at = ?,
                status = 'responded',
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(response)
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Doubt not found".to_string()));
        }

        self.fetch_required(id).await
    }

    async fn resolve(&self, id: Uuid) -> Result<Doubt> {
        let now = Utc::now().naive_utc();
        // Resolving an already-resolved doubt just rewrites the same status.
        let result = sqlx::query(
            r#"
            UPDATE doubts
            SET status = 'resolved',
                resolved_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Doubt not found".to_string()));
        }

        self.fetch_required(id).await
    }
}
