use crate::{
    errors::ApiError,
    handlers::common::{created_response, no_content_response, parse_json, success_response},
    services::settings::{CreateSettingInput, UpdateSettingInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};

pub async fn list_settings(State(state): State<AppState>) -> Result<Response, ApiError> {
    let settings = state.services.settings.list_all().await?;
    Ok(success_response(settings))
}

pub async fn list_settings_group(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Response, ApiError> {
    let settings = state.services.settings.list_group(&group).await?;
    Ok(success_response(settings))
}

pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let setting = state.services.settings.get_by_key(&key).await?;
    Ok(success_response(setting))
}

pub async fn create_setting(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: CreateSettingInput = parse_json(body)?;
    let setting = state.services.settings.create(input).await?;
    Ok(created_response(setting))
}

pub async fn update_setting(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, ApiError> {
    let input: UpdateSettingInput = parse_json(body)?;
    let setting = state.services.settings.update(id, input).await?;
    Ok(success_response(setting))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ApiError> {
    state.services.settings.delete(id).await?;
    Ok(no_content_response())
}
