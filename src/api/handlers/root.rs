use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Learnly API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Doubt-solving and subscription backend for students",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "auth": "/api/auth",
            "user": "/api/user",
            "payment": "/api/payment",
            "admin": "/api/admin"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
