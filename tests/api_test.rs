use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use learnly::{
    api,
    auth::{IdentityClaims, StaticTokenVerifier, TokenVerifier},
    config::Settings,
    repository::{SqliteDoubtRepository, SqlitePaymentRepository, SqliteProfileRepository},
    service::ServiceContext,
    storage::{LocalDiskBackend, UploadBackend, UploadManager},
};

const ADMIN_KEY: &str = "test-admin-key";

async fn test_app() -> anyhow::Result<Router> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let profile_repo = Arc::new(SqliteProfileRepository::new(pool.clone()));
    let payment_repo = Arc::new(SqlitePaymentRepository::new(pool.clone()));
    let doubt_repo = Arc::new(SqliteDoubtRepository::new(pool.clone()));

    let uploads_dir = std::env::temp_dir().join(format!("learnly-api-test-{}", Uuid::new_v4()));
    let uploads_dir = uploads_dir.to_str().unwrap().to_string();
    let disk = |subdir: &str, prefix: &str| {
        Arc::new(UploadManager::new(vec![Arc::new(LocalDiskBackend::new(
            &uploads_dir,
            subdir,
            prefix,
        )) as Arc<dyn UploadBackend>]))
    };

    let service_context = Arc::new(ServiceContext::new(
        profile_repo,
        payment_repo,
        doubt_repo,
        disk("payment-proofs", "payment-proof"),
        disk("doubt-images", "doubt-image"),
        disk("profile-pictures", "profile-pic"),
        pool,
    ));

    let mut verifier = StaticTokenVerifier::new();
    verifier.insert(
        "student-token",
        IdentityClaims {
            subject: "student-1".to_string(),
            email: Some("student@example.com".to_string()),
            phone_number: None,
        },
    );
    let token_verifier: Arc<dyn TokenVerifier> = Arc::new(verifier);

    let mut settings = Settings::default();
    settings.admin.api_key = ADMIN_KEY.to_string();
    settings.storage.uploads_dir = uploads_dir;

    Ok(api::create_app(service_context, token_verifier, Arc::new(settings)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_is_public() -> anyhow::Result<()> {
    let app = test_app().await?;

    let response = app
        .oneshot(Request::get("/health").body(Body::empty())?)
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn student_routes_require_a_valid_bearer_token() -> anyhow::Result<()> {
    let app = test_app().await?;

    let response = app
        .clone()
        .oneshot(Request::get("/api/auth/profile").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::get("/api/auth/profile")
                .header(header::AUTHORIZATION, "Bearer bogus")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn create_profile_then_fetch_it() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut request = json_request(
        "POST",
        "/api/auth/create-profile",
        json!({ "name": "Asha Verma", "phone": "+919876543210" }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer student-token".parse()?);

    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Profile created successfully");

    let response = app
        .oneshot(
            Request::get("/api/auth/profile")
                .header(header::AUTHORIZATION, "Bearer student-token")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = body_json(response).await;
    assert_eq!(profile["id"], "student-1");
    assert_eq!(profile["name"], "Asha Verma");
    assert_eq!(profile["email"], "student@example.com");
    assert_eq!(profile["role"], "student");
    assert_eq!(profile["subscriptionStatus"], "inactive");
    assert_eq!(profile["doubtAccess"], false);

    Ok(())
}

#[tokio::test]
async fn admin_routes_accept_header_or_query_key() -> anyhow::Result<()> {
    let app = test_app().await?;

    let response = app
        .clone()
        .oneshot(Request::get("/api/admin/users").body(Body::empty())?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/users")
                .header("admin-key", "wrong-key")
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::get("/api/admin/users")
                .header("admin-key", ADMIN_KEY)
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::get(format!("/api/admin/users?adminKey={}", ADMIN_KEY))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn approve_payment_rejects_incomplete_bodies() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut request = json_request(
        "POST",
        "/api/admin/approve-payment",
        json!({ "approve": true }),
    );
    request.headers_mut().insert("admin-key", ADMIN_KEY.parse()?);

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Invalid request data. paymentId and approve (boolean) are required."
    );

    Ok(())
}

#[tokio::test]
async fn approve_payment_for_unknown_id_is_not_found() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut request = json_request(
        "POST",
        "/api/admin/approve-payment",
        json!({ "paymentId": Uuid::new_v4(), "approve": true }),
    );
    request.headers_mut().insert("admin-key", ADMIN_KEY.parse()?);

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn toggle_doubt_access_for_unknown_user_is_not_found() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut request = json_request(
        "POST",
        "/api/admin/toggle-doubt-access",
        json!({ "userId": "nobody", "enabled": true }),
    );
    request.headers_mut().insert("admin-key", ADMIN_KEY.parse()?);

    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn update_phone_validates_the_number() -> anyhow::Result<()> {
    let app = test_app().await?;

    let mut request = json_request(
        "POST",
        "/api/auth/create-profile",
        json!({ "name": "Asha Verma" }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer student-token".parse()?);
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let mut request = json_request(
        "POST",
        "/api/auth/update-phone",
        json!({ "phone": "not-a-number" }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer student-token".parse()?);
    let response = app.clone().oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid phone number format");

    let mut request = json_request(
        "POST",
        "/api/auth/update-phone",
        json!({ "phone": "+14155550123" }),
    );
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer student-token".parse()?);
    let response = app.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}
