use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    api::{handlers::read_image_field, middleware::auth::AuthUser, state::AppState},
    domain::Doubt,
    error::{AppError, Result},
    storage::UploadedImage,
};

/// Multipart form: `subject`, `question`, optional `image`.
pub async fn submit_doubt(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let user_id = &user.claims.subject;

    let mut subject = String::new();
    let mut question = String::new();
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("subject") => {
                subject = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            Some("question") => {
                question = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            Some("image") => {
                image = Some(read_image_field(field, user_id).await?);
            }
            _ => {}
        }
    }

    let doubt = state
        .service_context
        .doubt_service
        .submit_doubt(user_id, &subject, &question, image)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doubt submitted successfully",
        "doubtId": doubt.id,
    })))
}

pub async fn my_doubts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Doubt>>> {
    let doubts = state
        .service_context
        .doubt_service
        .my_doubts(&user.claims.subject)
        .await?;

    Ok(Json(doubts))
}

/// Multipart form: `profilePicture` image.
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let user_id = &user.claims.subject;

    let mut picture: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some("profilePicture") {
            picture = Some(read_image_field(field, user_id).await?);
        }
    }

    let picture =
        picture.ok_or_else(|| AppError::Validation("No file uploaded".to_string()))?;

    let profile = state
        .service_context
        .profile_service
        .set_profile_picture(user_id, picture)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile picture uploaded successfully",
        "profilePictureUrl": profile.profile_picture_url,
    })))
}
