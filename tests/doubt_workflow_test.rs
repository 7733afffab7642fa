use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use learnly::{
    domain::{CreateProfileRequest, DoubtStatus, UserRole},
    error::AppError,
    repository::{
        ProfileRepository, SqliteDoubtRepository, SqlitePaymentRepository, SqliteProfileRepository,
    },
    service::ServiceContext,
    storage::{LocalDiskBackend, UploadBackend, UploadManager, UploadedImage},
};

async fn setup() -> anyhow::Result<(SqlitePool, Arc<ServiceContext>)> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let profile_repo = Arc::new(SqliteProfileRepository::new(pool.clone()));
    let payment_repo = Arc::new(SqlitePaymentRepository::new(pool.clone()));
    let doubt_repo = Arc::new(SqliteDoubtRepository::new(pool.clone()));

    let uploads_dir = std::env::temp_dir().join(format!("learnly-test-{}", Uuid::new_v4()));
    let uploads_dir = uploads_dir.to_str().unwrap().to_string();
    let disk = |subdir: &str, prefix: &str| {
        Arc::new(UploadManager::new(vec![Arc::new(LocalDiskBackend::new(
            &uploads_dir,
            subdir,
            prefix,
        )) as Arc<dyn UploadBackend>]))
    };

    let context = Arc::new(ServiceContext::new(
        profile_repo,
        payment_repo,
        doubt_repo,
        disk("payment-proofs", "payment-proof"),
        disk("doubt-images", "doubt-image"),
        disk("profile-pictures", "profile-pic"),
        pool.clone(),
    ));

    Ok((pool, context))
}

async fn create_student(context: &ServiceContext, subject: &str) -> anyhow::Result<()> {
    context
        .profile_repo
        .upsert(CreateProfileRequest {
            subject: subject.to_string(),
            name: Some("Test Student".to_string()),
            email: Some("student@example.com".to_string()),
            phone: None,
            role: Some(UserRole::Student),
        })
        .await?;
    Ok(())
}

async fn activate_subscription(pool: &SqlitePool, subject: &str) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET subscription_status = 'active', doubt_access = 1 WHERE id = ?")
        .bind(subject)
        .execute(pool)
        .await?;
    Ok(())
}

#[tokio::test]
async fn submit_doubt_forbidden_without_access() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;

    // Fresh signup: inactive, no doubt access.
    let result = context
        .doubt_service
        .submit_doubt("student-1", "Math", "What is 2+2?", None)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Admin toggle alone does not satisfy the subscription check.
    context
        .profile_service
        .set_doubt_access("student-1", true)
        .await?;
    let result = context
        .doubt_service
        .submit_doubt("student-1", "Math", "What is 2+2?", None)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    // Active subscription but access revoked by an admin: still forbidden.
    activate_subscription(&pool, "student-1").await?;
    context
        .profile_service
        .set_doubt_access("student-1", false)
        .await?;
    let result = context
        .doubt_service
        .submit_doubt("student-1", "Math", "What is 2+2?", None)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    Ok(())
}

#[tokio::test]
async fn submit_doubt_unknown_user_is_not_found() -> anyhow::Result<()> {
    let (_pool, context) = setup().await?;

    let result = context
        .doubt_service
        .submit_doubt("nobody", "Math", "What is 2+2?", None)
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn submit_doubt_creates_pending_record_with_image() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;
    activate_subscription(&pool, "student-1").await?;

    let image = UploadedImage {
        data: vec![0x89, 0x50, 0x4e, 0x47],
        content_type: "image/png".to_string(),
        original_name: "homework.png".to_string(),
        owner_id: "student-1".to_string(),
    };

    let doubt = context
        .doubt_service
        .submit_doubt("student-1", "Physics", "Why is the sky blue?", Some(image))
        .await?;

    assert_eq!(doubt.status, DoubtStatus::Pending);
    assert_eq!(doubt.admin_response, None);
    let image_url = doubt.image_url.expect("image url should be set");
    assert!(image_url.starts_with("/uploads/doubt-images/"));
    assert!(image_url.ends_with(".png"));

    Ok(())
}

#[tokio::test]
async fn oversized_doubt_image_rejected_before_any_write() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;
    activate_subscription(&pool, "student-1").await?;

    let image = UploadedImage {
        data: vec![0u8; 3 * 1024 * 1024],
        content_type: "image/png".to_string(),
        original_name: "big.png".to_string(),
        owner_id: "student-1".to_string(),
    };

    let result = context
        .doubt_service
        .submit_doubt("student-1", "Physics", "Question?", Some(image))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let doubts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doubts")
        .fetch_one(&pool)
        .await?;
    assert_eq!(doubts, 0);

    Ok(())
}

#[tokio::test]
async fn my_doubts_sorts_newest_first_with_undated_rows_last() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;

    let insert = |id: Uuid, subject: &str, created_at: Option<&str>| {
        let subject = subject.to_string();
        let created_at = created_at.map(str::to_string);
        let pool = pool.clone();
        async move {
            sqlx::query(
                r#"
                INSERT INTO doubts (id, user_id, subject, question, status, created_at)
                VALUES (?, 'student-1', ?, 'q', 'pending', ?)
                "#,
            )
            .bind(id.to_string())
            .bind(subject)
            .bind(created_at)
            .execute(&pool)
            .await
        }
    };

    insert(Uuid::new_v4(), "old", Some("2024-01-01 10:00:00")).await?;
    insert(Uuid::new_v4(), "new", Some("2024-06-01 10:00:00")).await?;
    insert(Uuid::new_v4(), "undated", None).await?;

    let doubts = context.doubt_service.my_doubts("student-1").await?;
    let subjects: Vec<&str> = doubts.iter().map(|d| d.subject.as_str()).collect();
    assert_eq!(subjects, vec!["new", "old", "undated"]);

    Ok(())
}

#[tokio::test]
async fn respond_sets_response_and_status() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;
    activate_subscription(&pool, "student-1").await?;

    let doubt = context
        .doubt_service
        .submit_doubt("student-1", "Math", "What is 2+2?", None)
        .await?;

    let responded = context.doubt_service.respond(doubt.id, "It is 4.").await?;
    assert_eq!(responded.status, DoubtStatus::Responded);
    assert_eq!(responded.admin_response.as_deref(), Some("It is 4."));
    assert!(responded.responded_at.is_some());

    Ok(())
}

#[tokio::test]
async fn respond_requires_non_empty_text() -> anyhow::Result<()> {
    let (_pool, context) = setup().await?;

    let result = context.doubt_service.respond(Uuid::new_v4(), "   ").await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let result = context.doubt_service.respond(Uuid::new_v4(), "answer").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn resolve_doubt_is_idempotent() -> anyhow::Result<()> {
    let (pool, context) = setup().await?;
    create_student(&context, "student-1").await?;
    activate_subscription(&pool, "student-1").await?;

    let doubt = context
        .doubt_service
        .submit_doubt("student-1", "Math", "What is 2+2?", None)
        .await?;

    let first = context.doubt_service.resolve(doubt.id).await?;
    assert_eq!(first.status, DoubtStatus::Resolved);

    let second = context.doubt_service.resolve(doubt.id).await?;
    assert_eq!(second.status, DoubtStatus::Resolved);

    let missing = context.doubt_service.resolve(Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    Ok(())
}
