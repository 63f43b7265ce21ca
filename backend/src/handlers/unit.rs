//! HTTP handlers for unit registration and lookup

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::unit::{
    RegisterUnitInput, RegisterUnitsBulkInput, UnitLifecycle, UnitService, UnitWarranty,
};
use crate::AppState;
use shared::models::Unit;
use shared::types::Role;

/// Register a single unit (factory admin)
pub async fn register_unit(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterUnitInput>,
) -> AppResult<Json<Unit>> {
    current_user.0.require_factory_admin()?;
    let service = UnitService::new(state.db);
    let unit = service.register_unit(input).await?;
    Ok(Json(unit))
}

/// Register a batch of units (factory admin)
pub async fn register_units_bulk(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterUnitsBulkInput>,
) -> AppResult<Json<Vec<Unit>>> {
    current_user.0.require_factory_admin()?;
    let service = UnitService::new(state.db);
    let units = service.register_units_bulk(input).await?;
    Ok(Json(units))
}

/// List units. Dealers see only the units they hold.
pub async fn list_units(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Unit>>> {
    let scope = match current_user.0.role {
        Role::Dealer => current_user.0.dealer_id,
        Role::FactoryAdmin | Role::ServiceCenter => None,
    };

    let service = UnitService::new(state.db);
    let units = service.list_units(scope).await?;
    Ok(Json(units))
}

/// Get a unit by serial number
pub async fn get_unit(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(serial_number): Path<String>,
) -> AppResult<Json<Unit>> {
    let service = UnitService::new(state.db);
    let unit = service.get_unit(&serial_number).await?;
    Ok(Json(unit))
}

/// Get the full lifecycle view of a unit
pub async fn get_unit_lifecycle(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(serial_number): Path<String>,
) -> AppResult<Json<UnitLifecycle>> {
    let service = UnitService::new(state.db);
    let lifecycle = service.get_lifecycle(&serial_number).await?;
    Ok(Json(lifecycle))
}

/// Get the live warranty status of a unit
pub async fn get_unit_warranty(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(serial_number): Path<String>,
) -> AppResult<Json<UnitWarranty>> {
    let service = UnitService::new(state.db);
    let warranty = service.get_warranty(&serial_number).await?;
    Ok(Json(warranty))
}
