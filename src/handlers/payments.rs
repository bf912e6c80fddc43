use crate::{
    errors::ApiError,
    handlers::common::{parse_json, success_response},
    AppState,
};
use axum::{extract::State, response::Response, Json};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateIntentInput {
    pub order_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmIntentInput {
    pub payment_intent_id: String,
    pub order_id: i32,
}

/// Creates a payment intent for the order's stored total
pub async fn create_paymob_intent(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: CreateIntentInput = parse_json(body)?;
    let intent = state.services.payments.create_intent(input.order_id).await?;
    Ok(success_response(intent))
}

/// Confirms an intent; on success the order becomes `processing`/`paid`
pub async fn confirm_paymob_intent(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: ConfirmIntentInput = parse_json(body)?;
    let order = state
        .services
        .payments
        .confirm(&input.payment_intent_id, input.order_id)
        .await?;
    Ok(success_response(order))
}
