pub mod admin;
pub mod auth;
pub mod payment;
pub mod root;
pub mod user;

use axum::extract::multipart::Field;

use crate::{
    error::{AppError, Result},
    storage::UploadedImage,
};

/// Pull an uploaded file out of a multipart field, keeping the declared
/// content type and original filename for validation and naming.
pub(crate) async fn read_image_field(field: Field<'_>, owner_id: &str) -> Result<UploadedImage> {
    let original_name = field.file_name().unwrap_or("upload").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read uploaded file: {}", e)))?
        .to_vec();

    Ok(UploadedImage {
        data,
        content_type,
        original_name,
        owner_id: owner_id.to_string(),
    })
}
