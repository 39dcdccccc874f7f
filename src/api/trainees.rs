//! Trainee API endpoints, including checklist and daily details.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use super::{success, ApiJson, ApiResult};
use crate::db::{DetailStore, PeriodStore};
use crate::errors::AppError;
use crate::models::{
    ChecklistState, CreateTraineeRequest, DailyDetail, SetChecklistItemRequest, SetDetailRequest,
    Trainee, TraineeSummary,
};
use crate::AppState;

/// GET /api/trainees - List all trainees.
pub async fn list_trainees(State(state): State<AppState>) -> ApiResult<Vec<Trainee>> {
    success(state.repo.list_trainees().await?)
}

/// POST /api/trainees - Register a trainee.
pub async fn create_trainee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTraineeRequest>,
) -> ApiResult<Trainee> {
    success(state.repo.create_trainee(&request.name).await?)
}

/// GET /api/trainees/{name} - Trainee with period and checklist progress.
pub async fn get_trainee(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<TraineeSummary> {
    let trainee = state
        .repo
        .get_trainee(&name)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Trainee {} not found", name)))?;

    let period = state.repo.get_period(&name).await?;
    let checklist = state.repo.get_checklist(&name).await?;

    success(TraineeSummary {
        trainee,
        period,
        checklist_completed: checklist.completed_count(),
        checklist_total: checklist.len(),
    })
}

/// DELETE /api/trainees/{name} - Remove a trainee and all their training data.
pub async fn delete_trainee(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.repo.delete_trainee(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/trainees/{name}/checklist - Checklist flags.
pub async fn get_checklist(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<ChecklistState> {
    success(state.repo.get_checklist(&name).await?)
}

/// PUT /api/trainees/{name}/checklist - Set one checklist flag.
pub async fn set_checklist_item(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(request): ApiJson<SetChecklistItemRequest>,
) -> ApiResult<ChecklistState> {
    let checklist = state
        .repo
        .set_checklist_item(&name, &request.item, request.completed)
        .await?;
    success(checklist)
}

/// GET /api/trainees/{name}/details - Daily topics and notes.
pub async fn get_details(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<DailyDetail> {
    success(state.repo.get_details(&name).await?)
}

/// PUT /api/trainees/{name}/details - Set the topic or notes of one day.
pub async fn set_detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ApiJson(request): ApiJson<SetDetailRequest>,
) -> ApiResult<DailyDetail> {
    let details = state
        .repo
        .set_detail(&name, request.day_key, request.field, &request.value)
        .await?;
    success(details)
}
