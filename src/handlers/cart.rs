use crate::{
    auth::MaybeAuthUser,
    errors::ApiError,
    handlers::common::{parse_json, success_response},
    services::carts::CartItemMap,
    session::CartSession,
    AppState,
};
use axum::{extract::State, response::Response, Json};

/// Returns the session's item map, `{}` when the cart has never been touched.
pub async fn get_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> Result<Response, ApiError> {
    let items = state.services.carts.get(session.as_str()).await?;
    Ok(success_response(items))
}

/// Wholesale replacement of the session's cart. The response echoes the
/// stored map after sanitization. A body that is not an item map is a 400.
pub async fn replace_cart(
    State(state): State<AppState>,
    session: CartSession,
    MaybeAuthUser(user): MaybeAuthUser,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let items: CartItemMap = parse_json(body)?;

    let stored = state
        .services
        .carts
        .put(session.as_str(), user.map(|u| u.id), items)
        .await?;
    Ok(success_response(stored))
}
