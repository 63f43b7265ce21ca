//! HTTP handlers for the spare-parts ledger and derived stock

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::parts::{CreatePartDispatchInput, PartDispatchView, PartsService};
use crate::AppState;
use shared::stock::StockBalance;
use shared::types::Role;

/// Dispatch spare parts to a service center (factory admin)
pub async fn create_part_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreatePartDispatchInput>,
) -> AppResult<Json<PartDispatchView>> {
    current_user.0.require_factory_admin()?;
    let service = PartsService::new(state.db);
    let dispatch = service
        .create_part_dispatch(current_user.0.user_id, input)
        .await?;
    Ok(Json(dispatch))
}

/// Get a part dispatch. Service centers can only see their own.
pub async fn get_part_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
) -> AppResult<Json<PartDispatchView>> {
    let service = PartsService::new(state.db);
    let dispatch = service.get_part_dispatch(dispatch_id).await?;

    match current_user.0.role {
        Role::FactoryAdmin => {}
        Role::ServiceCenter => {
            if current_user.0.service_center_id != Some(dispatch.dispatch.service_center_id) {
                return Err(AppError::Forbidden(
                    "Dispatch belongs to another service center".to_string(),
                ));
            }
        }
        Role::Dealer => {
            return Err(AppError::Forbidden(
                "Dealers cannot view part dispatches".to_string(),
            ));
        }
    }

    Ok(Json(dispatch))
}

/// List part dispatches. Service centers see only their own.
pub async fn list_part_dispatches(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<PartDispatchView>>> {
    let scope = match current_user.0.role {
        Role::FactoryAdmin => None,
        Role::ServiceCenter => Some(current_user.0.require_service_center()?),
        Role::Dealer => {
            return Err(AppError::Forbidden(
                "Dealers cannot view part dispatches".to_string(),
            ));
        }
    };

    let service = PartsService::new(state.db);
    let dispatches = service.list_part_dispatches(scope).await?;
    Ok(Json(dispatches))
}

/// Derived stock balance of a service center
pub async fn get_center_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(center_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockBalance>>> {
    match current_user.0.role {
        Role::FactoryAdmin => {}
        Role::ServiceCenter => {
            if current_user.0.service_center_id != Some(center_id) {
                return Err(AppError::Forbidden(
                    "Stock belongs to another service center".to_string(),
                ));
            }
        }
        Role::Dealer => {
            return Err(AppError::Forbidden(
                "Dealers cannot view service center stock".to_string(),
            ));
        }
    }

    let service = PartsService::new(state.db);
    let stock = service.derive_stock(center_id).await?;
    Ok(Json(stock))
}
