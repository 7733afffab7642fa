use std::sync::Arc;
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use learnly::{
    api,
    auth::{FirebaseTokenVerifier, TokenVerifier},
    config::Settings,
    repository::{SqliteDoubtRepository, SqlitePaymentRepository, SqliteProfileRepository},
    service::ServiceContext,
    storage::{
        CloudinaryBackend, FirebaseStorageBackend, LocalDiskBackend, UploadBackend, UploadManager,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnly=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!(
        "Starting Learnly server on {}:{}",
        settings.server.host,
        settings.server.port
    );

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Initialize repositories
    let profile_repo = Arc::new(SqliteProfileRepository::new(db_pool.clone()));
    let payment_repo = Arc::new(SqlitePaymentRepository::new(db_pool.clone()));
    let doubt_repo = Arc::new(SqliteDoubtRepository::new(db_pool.clone()));

    // Payment proofs go to cloud storage, with Cloudinary as the fallback.
    let mut proof_backends: Vec<Arc<dyn UploadBackend>> = Vec::new();
    if let Some(firebase) = settings.storage.firebase.clone().filter(|c| c.enabled) {
        tracing::info!("Firebase Storage backend enabled (bucket {})", firebase.bucket);
        proof_backends.push(Arc::new(FirebaseStorageBackend::new(firebase)));
    }
    if let Some(cloudinary) = settings.storage.cloudinary.clone().filter(|c| c.enabled) {
        tracing::info!("Cloudinary backend enabled ({})", cloudinary.cloud_name);
        proof_backends.push(Arc::new(CloudinaryBackend::new(cloudinary)));
    }
    if proof_backends.is_empty() {
        tracing::warn!("No cloud storage configured; payment proofs will be stored on local disk");
        proof_backends.push(Arc::new(LocalDiskBackend::new(
            &settings.storage.uploads_dir,
            "payment-proofs",
            "payment-proof",
        )));
    }
    let proof_uploads = Arc::new(UploadManager::new(proof_backends));

    // Doubt images and profile pictures always live on local disk.
    let doubt_image_uploads = Arc::new(UploadManager::new(vec![Arc::new(LocalDiskBackend::new(
        &settings.storage.uploads_dir,
        "doubt-images",
        "doubt-image",
    )) as Arc<dyn UploadBackend>]));
    let picture_uploads = Arc::new(UploadManager::new(vec![Arc::new(LocalDiskBackend::new(
        &settings.storage.uploads_dir,
        "profile-pictures",
        "profile-pic",
    )) as Arc<dyn UploadBackend>]));

    // Create service context
    let service_context = Arc::new(ServiceContext::new(
        profile_repo,
        payment_repo,
        doubt_repo,
        proof_uploads,
        doubt_image_uploads,
        picture_uploads,
        db_pool.clone(),
    ));

    // Token verification against the identity provider's published keys
    let token_verifier: Arc<dyn TokenVerifier> =
        Arc::new(FirebaseTokenVerifier::new(settings.firebase.clone()));

    let settings = Arc::new(settings);
    let app = api::create_app(service_context, token_verifier, settings.clone());

    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;

    tracing::info!(
        "Server listening on http://{}:{}",
        settings.server.host,
        settings.server.port
    );

    axum::serve(listener, app).await?;

    Ok(())
}
