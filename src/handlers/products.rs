use crate::{
    errors::ApiError,
    handlers::common::{created_response, no_content_response, parse_json, success_response},
    services::catalog::{CreateProductInput, UpdateProductInput},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    response::Response,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

pub async fn list_products(State(state): State<AppState>) -> Result<Response, ApiError> {
    let products = state.services.catalog.list_products().await?;
    Ok(success_response(products))
}

pub async fn new_arrivals(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ApiError> {
    let products = state.services.catalog.new_arrivals(query.limit).await?;
    Ok(success_response(products))
}

pub async fn featured_products(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ApiError> {
    let products = state.services.catalog.featured(query.limit).await?;
    Ok(success_response(products))
}

pub async fn products_by_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let products = state
        .services
        .catalog
        .products_by_category_slug(&slug)
        .await?;
    Ok(success_response(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let product = state.services.catalog.get_product_by_slug(&slug).await?;
    Ok(success_response(product))
}

pub async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: CreateProductInput = parse_json(body)?;
    let product = state.services.catalog.create_product(input).await?;
    Ok(created_response(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: UpdateProductInput = parse_json(body)?;
    let product = state.services.catalog.update_product(id, input).await?;
    Ok(success_response(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.services.catalog.delete_product(id).await?;
    Ok(no_content_response())
}
