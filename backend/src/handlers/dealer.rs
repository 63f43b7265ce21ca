//! HTTP handlers for dealer network and service center endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::dealer::{CreateDealerInput, CreateServiceCenterInput, DealerService};
use crate::AppState;
use shared::models::{Dealer, ServiceCenter};

/// Create a main dealer (factory admin)
pub async fn create_dealer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateDealerInput>,
) -> AppResult<Json<Dealer>> {
    current_user.0.require_factory_admin()?;
    let service = DealerService::new(state.db);
    let dealer = service.create_dealer(input).await?;
    Ok(Json(dealer))
}

/// Get a dealer
pub async fn get_dealer(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(dealer_id): Path<Uuid>,
) -> AppResult<Json<Dealer>> {
    let service = DealerService::new(state.db);
    let dealer = service.get_dealer(dealer_id).await?;
    Ok(Json(dealer))
}

/// List main dealers
pub async fn list_dealers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<Dealer>>> {
    let service = DealerService::new(state.db);
    let dealers = service.list_dealers().await?;
    Ok(Json(dealers))
}

/// Create a sub-dealer (factory admin, or the parent dealer itself)
pub async fn create_sub_dealer(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(dealer_id): Path<Uuid>,
    Json(input): Json<CreateDealerInput>,
) -> AppResult<Json<Dealer>> {
    let user = &current_user.0;
    if !user.is_factory_admin() && user.dealer_id != Some(dealer_id) {
        return Err(AppError::Forbidden(
            "Only the parent dealer or a factory admin can create sub-dealers".to_string(),
        ));
    }

    let service = DealerService::new(state.db);
    let dealer = service.create_sub_dealer(dealer_id, input).await?;
    Ok(Json(dealer))
}

/// List sub-dealers of a main dealer
pub async fn list_sub_dealers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(dealer_id): Path<Uuid>,
) -> AppResult<Json<Vec<Dealer>>> {
    let service = DealerService::new(state.db);
    let dealers = service.list_sub_dealers(dealer_id).await?;
    Ok(Json(dealers))
}

/// Create a service center (factory admin)
pub async fn create_service_center(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateServiceCenterInput>,
) -> AppResult<Json<ServiceCenter>> {
    current_user.0.require_factory_admin()?;
    let service = DealerService::new(state.db);
    let center = service.create_service_center(input).await?;
    Ok(Json(center))
}

/// Get a service center
pub async fn get_service_center(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(center_id): Path<Uuid>,
) -> AppResult<Json<ServiceCenter>> {
    let service = DealerService::new(state.db);
    let center = service.get_service_center(center_id).await?;
    Ok(Json(center))
}

/// List service centers
pub async fn list_service_centers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<ServiceCenter>>> {
    let service = DealerService::new(state.db);
    let centers = service.list_service_centers().await?;
    Ok(Json(centers))
}
