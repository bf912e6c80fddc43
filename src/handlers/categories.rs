use crate::{
    errors::ApiError,
    handlers::common::{created_response, no_content_response, parse_json, success_response},
    services::catalog::{CreateCategoryInput, UpdateCategoryInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ApiError> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let category = state.services.catalog.get_category_by_slug(&slug).await?;
    Ok(success_response(category))
}

pub async fn create_category(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: CreateCategoryInput = parse_json(body)?;
    let category = state.services.catalog.create_category(input).await?;
    Ok(created_response(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: UpdateCategoryInput = parse_json(body)?;
    let category = state.services.catalog.update_category(id, input).await?;
    Ok(success_response(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.services.catalog.delete_category(id).await?;
    Ok(no_content_response())
}
