use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{AuthMethod, CreateProfileRequest, SubscriptionStatus, UserProfile, UserRole},
    error::{AppError, Result},
    repository::ProfileRepository,
};

#[derive(FromRow)]
struct ProfileRow {
    id: String,
    name: String,
    email: String,
    phone: String,
    role: String,
    auth_method: String,
    subscription_status: String,
    doubt_access: bool,
    admin_approved: bool,
    payment_proof_uploaded: bool,
    profile_picture_url: Option<String>,
    last_payment_id: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const PROFILE_COLUMNS: &str = r#"
    id, name, email, phone, role, auth_method, subscription_status,
    doubt_access, admin_approved, payment_proof_uploaded,
    profile_picture_url, last_payment_id, created_at, updated_at
"#;

pub struct SqliteProfileRepository {
    pool: SqlitePool,
}

impl SqliteProfileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_profile(row: ProfileRow) -> Result<UserProfile> {
        Ok(UserProfile {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: Self::parse_role(&row.role)?,
            auth_method: Self::parse_auth_method(&row.auth_method)?,
            subscription_status: Self::parse_subscription_status(&row.subscription_status)?,
            doubt_access: row.doubt_access,
            admin_approved: row.admin_approved,
            payment_proof_uploaded: row.payment_proof_uploaded,
            profile_picture_url: row.profile_picture_url,
            last_payment_id: row
                .last_payment_id
                .map(|id| Uuid::parse_str(&id).map_err(|e| AppError::Database(e.to_string())))
                .transpose()?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn parse_role(s: &str) -> Result<UserRole> {
        match s {
            "student" => Ok(UserRole::Student),
            "admin" => Ok(UserRole::Admin),
            _ => Err(AppError::Database(format!("Invalid user role: {}", s))),
        }
    }

    fn role_to_str(role: &UserRole) -> &'static str {
        match role {
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }

    fn parse_auth_method(s: &str) -> Result<AuthMethod> {
        match s {
            "email" => Ok(AuthMethod::Email),
            "phone" => Ok(AuthMethod::Phone),
            _ => Err(AppError::Database(format!("Invalid auth method: {}", s))),
        }
    }

    fn parse_subscription_status(s: &str) -> Result<SubscriptionStatus> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "inactive" => Ok(SubscriptionStatus::Inactive),
            _ => Err(AppError::Database(format!("Invalid subscription status: {}", s))),
        }
    }

    async fn fetch_required(&self, id: &str) -> Result<UserProfile> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl ProfileRepository for SqliteProfileRepository {
    async fn upsert(&self, request: CreateProfileRequest) -> Result<UserProfile> {
        let name = request
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Student".to_string());
        let email = request.effective_email();
        let phone = request.phone.clone().unwrap_or_default();
        let role = Self::role_to_str(&request.role.unwrap_or(UserRole::Student));
        // Phone-auth signups carry the number in the token itself.
        let auth_method = if request.email.as_deref().map_or(true, str::is_empty) && !phone.is_empty() {
            "phone"
        } else {
            "email"
        };
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, phone, role, auth_method, subscription_status,
                doubt_access, admin_approved, payment_proof_uploaded,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, 'inactive', 0, 0, 0, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                phone = excluded.phone,
                role = excluded.role,
                auth_method = excluded.auth_method,
                subscription_status = 'inactive',
                doubt_access = 0,
                admin_approved = 0,
                payment_proof_uploaded = 0,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&request.subject)
        .bind(&name)
        .bind(&email)
        .bind(&phone)
        .bind(role)
        .bind(auth_method)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.fetch_required(&request.subject).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            PROFILE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_profile(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            PROFILE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_profile).collect()
    }

    async fn update_phone(&self, id: &str, phone: &str) -> Result<UserProfile> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query("UPDATE users SET phone = ?, updated_at = ? WHERE id = ?")
            .bind(phone)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.fetch_required(id).await
    }

    async fn set_doubt_access(&self, id: &str, enabled: bool) -> Result<UserProfile> {
        let now = Utc::now().naive_utc();
        let result = sqlx::query("UPDATE users SET doubt_access = ?, updated_at = ? WHERE id = ?")
            .bind(enabled)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.fetch_required(id).await
    }

    async fn set_payment_proof_uploaded(&self, id: &str, payment_id: Uuid) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            UPDATE users
            SET payment_proof_uploaded = 1,
                last_payment_id = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(payment_id.to_string())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn set_profile_picture(&self, id: &str, url: &str) -> Result<UserProfile> {
        let now = Utc::now().naive_utc();
        let result =
            sqlx::query("UPDATE users SET profile_picture_url = ?, updated_at = ? WHERE id = ?")
                .bind(url)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.fetch_required(id).await
    }
}
