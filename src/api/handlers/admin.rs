use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::state::AppState,
    domain::{DoubtWithOwner, PaymentWithOwner, UserProfile},
    error::{AppError, Result},
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserProfile>>> {
    let users = state.service_context.profile_service.list_users().await?;
    tracing::debug!("Listed {} users", users.len());
    Ok(Json(users))
}

pub async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<PaymentWithOwner>>> {
    let payments = state.service_context.payment_repo.list_with_owner().await?;
    Ok(Json(payments))
}

pub async fn list_doubts(State(state): State<AppState>) -> Result<Json<Vec<DoubtWithOwner>>> {
    let doubts = state.service_context.doubt_service.list_all().await?;
    Ok(Json(doubts))
}

// Request fields are optional so a missing field reports a 400 with a useful
// message instead of a bare deserialization error.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovePaymentBody {
    pub payment_id: Option<Uuid>,
    pub approve: Option<bool>,
}

pub async fn approve_payment(
    State(state): State<AppState>,
    Json(body): Json<ApprovePaymentBody>,
) -> Result<Json<Value>> {
    let (payment_id, approve) = match (body.payment_id, body.approve) {
        (Some(id), Some(approve)) => (id, approve),
        _ => {
            return Err(AppError::Validation(
                "Invalid request data. paymentId and approve (boolean) are required.".to_string(),
            ))
        }
    };

    let payment = state
        .service_context
        .payment_service
        .resolve_payment(payment_id, approve)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Payment {} successfully",
            if approve { "approved" } else { "rejected" }
        ),
        "userId": payment.user_id,
        "approve": approve,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleDoubtAccessBody {
    pub user_id: Option<String>,
    pub enabled: Option<bool>,
}

pub async fn toggle_doubt_access(
    State(state): State<AppState>,
    Json(body): Json<ToggleDoubtAccessBody>,
) -> Result<Json<Value>> {
    let (user_id, enabled) = match (body.user_id, body.enabled) {
        (Some(id), Some(enabled)) if !id.is_empty() => (id, enabled),
        _ => {
            return Err(AppError::Validation(
                "Invalid request data. userId and enabled (boolean) are required.".to_string(),
            ))
        }
    };

    state
        .service_context
        .profile_service
        .set_doubt_access(&user_id, enabled)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Doubt access {} successfully",
            if enabled { "enabled" } else { "disabled" }
        ),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondDoubtBody {
    pub doubt_id: Option<Uuid>,
    pub response: Option<String>,
}

pub async fn respond_doubt(
    State(state): State<AppState>,
    Json(body): Json<RespondDoubtBody>,
) -> Result<Json<Value>> {
    let (doubt_id, response) = match (body.doubt_id, body.response) {
        (Some(id), Some(response)) if !response.is_empty() => (id, response),
        _ => {
            return Err(AppError::Validation(
                "Doubt ID and response are required".to_string(),
            ))
        }
    };

    state
        .service_context
        .doubt_service
        .respond(doubt_id, &response)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Response added successfully",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveDoubtBody {
    pub doubt_id: Option<Uuid>,
}

pub async fn resolve_doubt(
    State(state): State<AppState>,
    Json(body): Json<ResolveDoubtBody>,
) -> Result<Json<Value>> {
    let doubt_id = body
        .doubt_id
        .ok_or_else(|| AppError::Validation("Doubt ID is required".to_string()))?;

    state.service_context.doubt_service.resolve(doubt_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Doubt resolved successfully",
    })))
}
