//! HTTP handlers for service jobs and replaced parts

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::service_job::{
    AddReplacedPartInput, CreateServiceJobInput, ServiceJobService, ServiceJobView,
};
use crate::AppState;
use shared::models::{ReplacedPart, ServiceJob};
use shared::types::Role;

/// Open a service job (service center)
pub async fn create_service_job(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateServiceJobInput>,
) -> AppResult<Json<ServiceJob>> {
    let center_id = current_user.0.require_service_center()?;
    let service = ServiceJobService::new(state.db);
    let job = service
        .create_service_job(center_id, current_user.0.user_id, input)
        .await?;
    Ok(Json(job))
}

/// Get a service job with its replacement records
pub async fn get_service_job(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<ServiceJobView>> {
    let service = ServiceJobService::new(state.db);
    let view = service.get_service_job(job_id).await?;

    if let Role::ServiceCenter = current_user.0.role {
        if current_user.0.service_center_id != Some(view.job.service_center_id) {
            return Err(AppError::Forbidden(
                "Job belongs to another service center".to_string(),
            ));
        }
    }

    Ok(Json(view))
}

/// List service jobs. Service centers see only their own.
pub async fn list_service_jobs(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ServiceJob>>> {
    let scope = match current_user.0.role {
        Role::FactoryAdmin => None,
        Role::ServiceCenter => Some(current_user.0.require_service_center()?),
        Role::Dealer => {
            return Err(AppError::Forbidden(
                "Dealers cannot view service jobs".to_string(),
            ));
        }
    };

    let service = ServiceJobService::new(state.db);
    let jobs = service.list_service_jobs(scope).await?;
    Ok(Json(jobs))
}

/// Record a replaced or repaired part against a job (service center)
pub async fn add_replaced_part(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(input): Json<AddReplacedPartInput>,
) -> AppResult<Json<ReplacedPart>> {
    let center_id = current_user.0.require_service_center()?;
    let service = ServiceJobService::new(state.db);
    let replaced = service.add_replaced_part(center_id, job_id, input).await?;
    Ok(Json(replaced))
}

/// List the replacement records of a job
pub async fn list_job_replaced_parts(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<Vec<ReplacedPart>>> {
    let service = ServiceJobService::new(state.db);
    let view = service.get_service_job(job_id).await?;

    if let Role::ServiceCenter = current_user.0.role {
        if current_user.0.service_center_id != Some(view.job.service_center_id) {
            return Err(AppError::Forbidden(
                "Job belongs to another service center".to_string(),
            ));
        }
    }

    Ok(Json(view.replaced_parts))
}
