//! Selection workflow endpoints: book a period step by step.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use super::{success, ApiJson, ApiResult};
use crate::db::PeriodStore;
use crate::errors::AppError;
use crate::models::{Depot, TrainingPeriod, Vehicle};
use crate::workflow::SelectionView;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartSelectionRequest {
    pub slot: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct DepotRequest {
    pub depot: Depot,
}

#[derive(Debug, Deserialize)]
pub struct VehicleRequest {
    pub vehicle: Vehicle,
}

/// POST /api/selections - An empty calendar slot was picked.
pub async fn start_selection(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<StartSelectionRequest>,
) -> ApiResult<SelectionView> {
    success(state.selections.start(request.slot)?)
}

/// PUT /api/selections/{id}/name - Enter the trainee name.
pub async fn enter_selection_name(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<NameRequest>,
) -> ApiResult<SelectionView> {
    let existing: Vec<String> = state
        .repo
        .list_periods()
        .await?
        .into_iter()
        .map(|period| period.trainee_name)
        .collect();

    success(
        state
            .selections
            .step(id, |workflow| workflow.enter_name(&request.name, &existing))?,
    )
}

/// PUT /api/selections/{id}/depot - Choose the depot.
pub async fn choose_selection_depot(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<DepotRequest>,
) -> ApiResult<SelectionView> {
    success(
        state
            .selections
            .step(id, |workflow| workflow.choose_depot(request.depot))?,
    )
}

/// PUT /api/selections/{id}/vehicle - Choose the vehicle and store the period.
pub async fn choose_selection_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<VehicleRequest>,
) -> ApiResult<TrainingPeriod> {
    let mut workflow = state.selections.take(id)?;

    if let Err(e) = workflow.choose_vehicle(request.vehicle) {
        state.selections.restore(id, workflow)?;
        return Err(e);
    }

    let store: &dyn PeriodStore = &*state.repo;
    success(workflow.commit(store).await?)
}

/// DELETE /api/selections/{id} - Abandon a selection.
pub async fn cancel_selection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.selections.cancel(id)?;
    Ok(StatusCode::NO_CONTENT)
}
