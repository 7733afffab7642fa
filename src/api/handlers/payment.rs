use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    api::{handlers::read_image_field, middleware::auth::AuthUser, state::AppState},
    domain::Payment,
    error::{AppError, Result},
    storage::UploadedImage,
};

/// Multipart form: `plan`, `amount`, optional `paymentMethod`, and the
/// `paymentProof` image.
pub async fn upload_proof(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let user_id = &user.claims.subject;

    let mut plan = String::new();
    let mut amount: Option<f64> = None;
    let mut payment_method: Option<String> = None;
    let mut proof: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("plan") => {
                plan = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
            }
            Some("amount") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;
                amount = Some(raw.parse().map_err(|_| {
                    AppError::Validation("Plan and amount are required".to_string())
                })?);
            }
            Some("paymentMethod") => {
                payment_method = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(e.to_string()))?,
                );
            }
            Some("paymentProof") => {
                proof = Some(read_image_field(field, user_id).await?);
            }
            _ => {}
        }
    }

    let proof = proof
        .ok_or_else(|| AppError::Validation("Payment proof file is required".to_string()))?;
    let amount =
        amount.ok_or_else(|| AppError::Validation("Plan and amount are required".to_string()))?;

    let payment = state
        .service_context
        .payment_service
        .submit_payment(user_id, &plan, amount, payment_method, proof)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment proof uploaded successfully. Please wait for admin approval.",
        "paymentId": payment.id,
        "proofUrl": payment.proof_url,
    })))
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Payment>>> {
    let payments = state
        .service_context
        .payment_service
        .payment_history(&user.claims.subject)
        .await?;

    Ok(Json(payments))
}
