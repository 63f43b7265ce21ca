//! HTTP handlers for the model and part catalog

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::catalog::{CatalogService, CreateModelInput, CreatePartInput};
use crate::AppState;
use shared::models::{InverterModel, Part};

/// Create an inverter model (factory admin)
pub async fn create_model(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateModelInput>,
) -> AppResult<Json<InverterModel>> {
    current_user.0.require_factory_admin()?;
    let service = CatalogService::new(state.db);
    let model = service.create_model(input).await?;
    Ok(Json(model))
}

/// Get an inverter model
pub async fn get_model(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(model_id): Path<Uuid>,
) -> AppResult<Json<InverterModel>> {
    let service = CatalogService::new(state.db);
    let model = service.get_model(model_id).await?;
    Ok(Json(model))
}

/// List inverter models
pub async fn list_models(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<InverterModel>>> {
    let service = CatalogService::new(state.db);
    let models = service.list_models().await?;
    Ok(Json(models))
}

/// Create a spare part (factory admin)
pub async fn create_part(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartInput>,
) -> AppResult<Json<Part>> {
    current_user.0.require_factory_admin()?;
    let service = CatalogService::new(state.db);
    let part = service.create_part(input).await?;
    Ok(Json(part))
}

/// List spare parts
pub async fn list_parts(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Part>>> {
    let service = CatalogService::new(state.db);
    let parts = service.list_parts().await?;
    Ok(Json(parts))
}
