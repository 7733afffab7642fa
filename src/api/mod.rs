pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{auth::TokenVerifier, config::Settings, service::ServiceContext};
use state::AppState;

/// Room for a 2 MiB file plus form fields and multipart framing. Oversized
/// files inside the limit still get the friendly per-file error.
const MULTIPART_BODY_LIMIT: usize = 4 * 1024 * 1024;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    token_verifier: Arc<dyn TokenVerifier>,
    settings: Arc<Settings>,
) -> Router {
    let uploads_dir = settings.storage.uploads_dir.clone();
    let app_state = AppState::new(service_context, token_verifier, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        // Authenticated student routes
        .nest("/api/auth", auth_routes(app_state.clone()))
        .nest("/api/payment", payment_routes(app_state.clone()))
        .nest("/api/user", user_routes(app_state.clone()))

        // Admin console routes
        .nest("/api/admin", admin_routes(app_state.clone()))

        // Locally stored images (doubt images, profile pictures, dev proofs)
        .nest_service("/uploads", ServeDir::new(uploads_dir))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/create-profile", post(handlers::auth::create_profile))
        .route("/profile", get(handlers::auth::get_profile))
        .route("/update-phone", post(handlers::auth::update_phone))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_user,
        ))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/upload-proof", post(handlers::payment::upload_proof))
        .route("/history", get(handlers::payment::history))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_user,
        ))
}

fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/submit-doubt", post(handlers::user::submit_doubt))
        .route("/my-doubts", get(handlers::user::my_doubts))
        .route(
            "/upload-profile-picture",
            post(handlers::user::upload_profile_picture),
        )
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_user,
        ))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/payments", get(handlers::admin::list_payments))
        .route("/doubts", get(handlers::admin::list_doubts))
        .route("/approve-payment", post(handlers::admin::approve_payment))
        .route(
            "/toggle-doubt-access",
            post(handlers::admin::toggle_doubt_access),
        )
        .route("/respond-doubt", post(handlers::admin::respond_doubt))
        .route("/resolve-doubt", post(handlers::admin::resolve_doubt))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
