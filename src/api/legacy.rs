//! Endpoints speaking the packed-title formats of older dashboard builds.
//!
//! `/events` and `/progress` are views over the structured periods: titles
//! are decoded on the way in and encoded on the way out.

use axum::extract::State;

use super::{success, today, ApiJson, ApiResult};
use crate::codec::{self, DecodedTitle};
use crate::db::PeriodStore;
use crate::models::{
    CreateEventRequest, CreateProgressRequest, Depot, EventRecord, NewPeriod, ProgressRecord,
    Vehicle,
};
use crate::AppState;

/// GET /api/events - Periods as `{id, title, start, end}`.
pub async fn list_events(State(state): State<AppState>) -> ApiResult<Vec<EventRecord>> {
    let periods = state.repo.list_periods().await?;
    success(periods.iter().map(EventRecord::from).collect())
}

/// POST /api/events - Store a period from a packed title.
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ApiResult<EventRecord> {
    let start = codec::parse_day(&request.start)?;
    if let Some(raw_end) = request.end.as_deref() {
        let end = codec::parse_day(raw_end)?;
        if end != codec::derive_end(start) {
            tracing::warn!(%start, %end, "Ignoring client end date; periods always span 14 days");
        }
    }

    let decoded = codec::decode(&request.title);
    warn_outside_catalog(&decoded);
    let period = state
        .repo
        .create_period(&NewPeriod {
            trainee_name: codec::recover_name(&decoded.name)?,
            depot: decoded.depot,
            vehicle: decoded.vehicle,
            start,
        })
        .await?;

    success(EventRecord::from(&period))
}

/// GET /api/progress - Periods as `{id, user_id, stage, created_at}`.
pub async fn list_progress(State(state): State<AppState>) -> ApiResult<Vec<ProgressRecord>> {
    let periods = state.repo.list_periods().await?;
    success(periods.iter().map(ProgressRecord::from).collect())
}

/// POST /api/progress - Store a period starting today for `user_id`.
pub async fn create_progress(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateProgressRequest>,
) -> ApiResult<ProgressRecord> {
    let decoded = codec::decode(&request.stage);
    warn_outside_catalog(&decoded);
    let period = state
        .repo
        .create_period(&NewPeriod {
            trainee_name: codec::recover_name(&request.user_id)?,
            depot: decoded.depot,
            vehicle: decoded.vehicle,
            start: today(),
        })
        .await?;

    success(ProgressRecord::from(&period))
}

/// Legacy titles are free text, so values outside the catalog are kept as
/// written and only logged.
fn warn_outside_catalog(decoded: &DecodedTitle) {
    if let Some(depot) = decoded.depot.as_deref() {
        if Depot::from_name(depot).is_none() {
            tracing::warn!(depot, trainee = %decoded.name, "Legacy title names an unknown depot");
        }
    }
    if let Some(vehicle) = decoded.vehicle.as_deref() {
        if Vehicle::from_name(vehicle).is_none() {
            tracing::warn!(vehicle, trainee = %decoded.name, "Legacy title names an unknown vehicle");
        }
    }
}
