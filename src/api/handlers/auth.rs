use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    api::{middleware::auth::AuthUser, state::AppState},
    domain::UserProfile,
    error::{AppError, Result},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileBody {
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    pub user_type: Option<String>,
}

pub async fn create_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProfileBody>,
) -> Result<Json<Value>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .service_context
        .profile_service
        .create_profile(&user.claims, body.name, body.phone, body.user_type)
        .await?;

    tracing::info!(subject = %user.claims.subject, "Profile created");

    Ok(Json(json!({ "message": "Profile created successfully" })))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let profile = state
        .service_context
        .profile_service
        .get_profile(&user.claims.subject)
        .await?;

    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePhoneBody {
    pub phone: Option<String>,
}

pub async fn update_phone(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdatePhoneBody>,
) -> Result<Json<Value>> {
    let phone = body
        .phone
        .ok_or_else(|| AppError::Validation("Phone number is required".to_string()))?;

    state
        .service_context
        .profile_service
        .update_phone(&user.claims.subject, &phone)
        .await?;

    Ok(Json(json!({ "message": "Phone number updated successfully" })))
}
