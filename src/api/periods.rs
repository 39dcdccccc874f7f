//! Training period and calendar API endpoints.

use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;

use super::{success, today, ApiJson, ApiQuery, ApiResult};
use crate::calendar::{self, CalendarEvent};
use crate::db::PeriodStore;
use crate::models::{CreatePeriodRequest, DepotGroup, NewPeriod, TrainingPeriod};
use crate::AppState;

/// Calendar query parameters.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarQuery {
    /// Day to compute statuses for (default: today).
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

/// GET /api/periods - List all training periods.
pub async fn list_periods(State(state): State<AppState>) -> ApiResult<Vec<TrainingPeriod>> {
    success(state.repo.list_periods().await?)
}

/// POST /api/periods - Book a period in one request.
pub async fn create_period(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePeriodRequest>,
) -> ApiResult<TrainingPeriod> {
    let period = NewPeriod::new(
        request.trainee_name,
        request.depot,
        request.vehicle,
        request.start,
    );
    success(state.repo.create_period(&period).await?)
}

/// GET /api/periods/grouped - Periods grouped by depot.
pub async fn grouped_periods(State(state): State<AppState>) -> ApiResult<Vec<DepotGroup>> {
    let periods = state.repo.list_periods().await?;
    success(calendar::group_by_depot(&periods))
}

/// GET /api/calendar - Periods as calendar events with their current status.
pub async fn calendar_events(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CalendarQuery>,
) -> ApiResult<Vec<CalendarEvent>> {
    let periods = state.repo.list_periods().await?;
    let as_of = params.as_of.unwrap_or_else(today);
    success(calendar::project(&periods, as_of))
}
