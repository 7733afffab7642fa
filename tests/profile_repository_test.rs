use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use learnly::{
    domain::{AuthMethod, CreateProfileRequest, SubscriptionStatus, UserRole},
    error::AppError,
    repository::{ProfileRepository, SqliteProfileRepository},
};

async fn setup() -> anyhow::Result<SqliteProfileRepository> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(SqliteProfileRepository::new(pool))
}

fn email_signup(subject: &str) -> CreateProfileRequest {
    CreateProfileRequest {
        subject: subject.to_string(),
        name: Some("Asha Verma".to_string()),
        email: Some("asha@example.com".to_string()),
        phone: None,
        role: Some(UserRole::Student),
    }
}

#[tokio::test]
async fn upsert_creates_profile_with_initial_flags() -> anyhow::Result<()> {
    let repo = setup().await?;

    let profile = repo.upsert(email_signup("uid-1")).await?;

    assert_eq!(profile.id, "uid-1");
    assert_eq!(profile.role, UserRole::Student);
    assert_eq!(profile.auth_method, AuthMethod::Email);
    assert_eq!(profile.subscription_status, SubscriptionStatus::Inactive);
    assert!(!profile.doubt_access);
    assert!(!profile.admin_approved);
    assert!(!profile.payment_proof_uploaded);
    assert_eq!(profile.last_payment_id, None);

    let found = repo.find_by_id("uid-1").await?.expect("profile exists");
    assert_eq!(found.email, profile.email);

    Ok(())
}

#[tokio::test]
async fn phone_signup_synthesizes_email_and_auth_method() -> anyhow::Result<()> {
    let repo = setup().await?;

    let profile = repo
        .upsert(CreateProfileRequest {
            subject: "uid-phone".to_string(),
            name: Some("Rahul Iyer".to_string()),
            email: None,
            phone: Some("+919876543210".to_string()),
            role: None,
        })
        .await?;

    assert_eq!(profile.email, "+919876543210@phone.auth");
    assert_eq!(profile.auth_method, AuthMethod::Phone);
    assert_eq!(profile.role, UserRole::Student);

    Ok(())
}

#[tokio::test]
async fn reregistering_resets_approval_flags() -> anyhow::Result<()> {
    let repo = setup().await?;

    repo.upsert(email_signup("uid-1")).await?;
    repo.set_payment_proof_uploaded("uid-1", Uuid::new_v4()).await?;
    repo.set_doubt_access("uid-1", true).await?;

    let before = repo.find_by_id("uid-1").await?.unwrap();
    assert!(before.payment_proof_uploaded);
    assert!(before.doubt_access);

    // Signing up again overwrites the whole profile.
    let after = repo.upsert(email_signup("uid-1")).await?;
    assert_eq!(after.subscription_status, SubscriptionStatus::Inactive);
    assert!(!after.doubt_access);
    assert!(!after.admin_approved);
    assert!(!after.payment_proof_uploaded);

    Ok(())
}

#[tokio::test]
async fn update_phone_replaces_number() -> anyhow::Result<()> {
    let repo = setup().await?;
    repo.upsert(email_signup("uid-1")).await?;

    let updated = repo.update_phone("uid-1", "+14155550123").await?;
    assert_eq!(updated.phone, "+14155550123");

    Ok(())
}

#[tokio::test]
async fn updates_against_unknown_users_are_not_found() -> anyhow::Result<()> {
    let repo = setup().await?;

    let result = repo.update_phone("nobody", "+14155550123").await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = repo.set_doubt_access("nobody", true).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = repo
        .set_profile_picture("nobody", "/uploads/profile-pictures/x.png")
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    assert!(repo.find_by_id("nobody").await?.is_none());

    Ok(())
}

#[tokio::test]
async fn list_returns_all_profiles() -> anyhow::Result<()> {
    let repo = setup().await?;

    repo.upsert(email_signup("uid-1")).await?;
    repo.upsert(CreateProfileRequest {
        subject: "uid-2".to_string(),
        name: Some("Admin".to_string()),
        email: Some("admin@example.com".to_string()),
        phone: None,
        role: Some(UserRole::Admin),
    })
    .await?;

    let users = repo.list().await?;
    assert_eq!(users.len(), 2);
    assert!(users.iter().any(|u| u.role == UserRole::Admin));

    Ok(())
}
