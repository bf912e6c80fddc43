use crate::{
    auth::{AuthUser, MaybeAuthUser},
    entities::order::{OrderStatus, PaymentStatus},
    errors::ApiError,
    handlers::common::{created_response, parse_json, success_response, validate_input},
    services::checkout::PlaceOrderInput,
    session::CartSession,
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TrackOrderInput {
    pub order_id: i32,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusInput {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let orders = state.services.orders.list_for_user(user.id).await?;
    Ok(success_response(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    user: AuthUser,
) -> Result<Response, ApiError> {
    let order = state.services.orders.get_order_authorized(&user, id).await?;
    Ok(success_response(order))
}

/// Checkout: converts the session's cart into an order
pub async fn place_order(
    State(state): State<AppState>,
    session: CartSession,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: PlaceOrderInput = parse_json(body)?;
    validate_input(&input)?;

    let order = state
        .services
        .checkout
        .place_order(session.as_str(), user.map(|u| u.id), input)
        .await?;
    Ok(created_response(order))
}

/// Guest order lookup by id and matching email
pub async fn track_order(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: TrackOrderInput = parse_json(body)?;
    let order = state
        .services
        .orders
        .track(input.order_id, &input.email)
        .await?;
    Ok(success_response(order))
}

pub async fn list_all_orders(State(state): State<AppState>) -> Result<Response, ApiError> {
    let orders = state.services.orders.list_all().await?;
    Ok(success_response(orders))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: UpdateOrderStatusInput = parse_json(body)?;
    let order = state
        .services
        .orders
        .update_status(id, input.status, input.payment_status)
        .await?;
    Ok(success_response(order))
}
