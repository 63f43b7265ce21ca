//! HTTP handlers for custody movements: dispatches, transfers, and sales

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::ownership::{
    CreateUnitDispatchInput, CreateUnitTransferInput, OwnershipService, RecordSaleInput,
    RecordSalesBulkInput, UnitDispatchView, UnitTransferView,
};
use crate::AppState;
use shared::lifecycle::Seller;
use shared::models::{SaleRecord, Unit};
use shared::types::Role;

/// Dispatch units from the factory to a main dealer (factory admin)
pub async fn create_unit_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUnitDispatchInput>,
) -> AppResult<Json<UnitDispatchView>> {
    current_user.0.require_factory_admin()?;
    let service = OwnershipService::new(state.db);
    let dispatch = service
        .create_unit_dispatch(current_user.0.user_id, input)
        .await?;
    Ok(Json(dispatch))
}

/// Get a unit dispatch
pub async fn get_unit_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(dispatch_id): Path<Uuid>,
) -> AppResult<Json<UnitDispatchView>> {
    let service = OwnershipService::new(state.db);
    let dispatch = service.get_unit_dispatch(dispatch_id).await?;

    if let Role::Dealer = current_user.0.role {
        if current_user.0.dealer_id != Some(dispatch.dispatch.dealer_id) {
            return Err(AppError::Forbidden(
                "Dispatch belongs to another dealer".to_string(),
            ));
        }
    }

    Ok(Json(dispatch))
}

/// List unit dispatches. Dealers see only their own.
pub async fn list_unit_dispatches(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UnitDispatchView>>> {
    let scope = match current_user.0.role {
        Role::Dealer => current_user.0.dealer_id,
        Role::FactoryAdmin | Role::ServiceCenter => None,
    };

    let service = OwnershipService::new(state.db);
    let dispatches = service.list_unit_dispatches(scope).await?;
    Ok(Json(dispatches))
}

/// Transfer units to a sub-dealer (dealer)
pub async fn create_unit_transfer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateUnitTransferInput>,
) -> AppResult<Json<UnitTransferView>> {
    let dealer_id = current_user.0.require_dealer()?;
    let service = OwnershipService::new(state.db);
    let transfer = service
        .create_unit_transfer(dealer_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(transfer))
}

/// List transfers. Dealers see only their own.
pub async fn list_unit_transfers(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<UnitTransferView>>> {
    let scope = match current_user.0.role {
        Role::Dealer => current_user.0.dealer_id,
        Role::FactoryAdmin | Role::ServiceCenter => None,
    };

    let service = OwnershipService::new(state.db);
    let transfers = service.list_unit_transfers(scope).await?;
    Ok(Json(transfers))
}

/// Record a customer sale. Dealers and sub-dealers sell units they hold;
/// a factory admin can sell a unit still in factory custody.
pub async fn record_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<Json<Unit>> {
    let seller = match current_user.0.role {
        Role::FactoryAdmin => Seller::Factory,
        Role::Dealer => Seller::Dealer(current_user.0.require_dealer()?),
        Role::ServiceCenter => {
            return Err(AppError::Forbidden(
                "Service centers cannot record sales".to_string(),
            ));
        }
    };

    let service = OwnershipService::new(state.db);
    let unit = service
        .record_sale(seller, current_user.0.user_id, input)
        .await?;
    Ok(Json(unit))
}

/// Record a sale of several units on one invoice
pub async fn record_sales_bulk(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSalesBulkInput>,
) -> AppResult<Json<Vec<Unit>>> {
    let seller = match current_user.0.role {
        Role::FactoryAdmin => Seller::Factory,
        Role::Dealer => Seller::Dealer(current_user.0.require_dealer()?),
        Role::ServiceCenter => {
            return Err(AppError::Forbidden(
                "Service centers cannot record sales".to_string(),
            ));
        }
    };

    let service = OwnershipService::new(state.db);
    let units = service
        .record_sales_bulk(seller, current_user.0.user_id, input)
        .await?;
    Ok(Json(units))
}

/// List sale records. Dealers see only their own sales.
pub async fn list_sales(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<SaleRecord>>> {
    let scope = match current_user.0.role {
        Role::Dealer => current_user.0.dealer_id,
        Role::FactoryAdmin | Role::ServiceCenter => None,
    };

    let service = OwnershipService::new(state.db);
    let sales = service.list_sales(scope).await?;
    Ok(Json(sales))
}
