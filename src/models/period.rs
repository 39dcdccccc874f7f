//! Training period model and the legacy wire shapes built on top of it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Depot, Vehicle};
use crate::codec;

/// A trainee's 14-day training window. `end` is fixed when the record is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrainingPeriod {
    pub id: String,
    pub trainee_name: String,
    /// Absent only for records imported from titles without a depot
    pub depot: Option<String>,
    /// Absent for legacy two-field titles
    pub vehicle: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TrainingPeriod {
    /// Legacy packed title of this period.
    pub fn title(&self) -> String {
        codec::encode(
            &self.trainee_name,
            self.depot.as_deref(),
            self.vehicle.as_deref(),
        )
    }
}

/// Store input for a new period. The store derives `end` from `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    pub trainee_name: String,
    pub depot: Option<String>,
    pub vehicle: Option<String>,
    pub start: NaiveDate,
}

impl NewPeriod {
    pub fn new(
        trainee_name: impl Into<String>,
        depot: Depot,
        vehicle: Vehicle,
        start: NaiveDate,
    ) -> Self {
        Self {
            trainee_name: trainee_name.into(),
            depot: Some(depot.as_str().to_string()),
            vehicle: Some(vehicle.as_str().to_string()),
            start,
        }
    }
}

/// Request body for `POST /api/periods`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePeriodRequest {
    pub trainee_name: String,
    pub depot: Depot,
    pub vehicle: Vehicle,
    pub start: NaiveDate,
}

/// Legacy event view: the period with its three identity fields packed into a title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl From<&TrainingPeriod> for EventRecord {
    fn from(period: &TrainingPeriod) -> Self {
        Self {
            id: period.id.clone(),
            title: period.title(),
            start: period.start,
            end: period.end,
        }
    }
}

/// Request body for `POST /api/events`. Dates may be plain days or RFC 3339 timestamps.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

/// Legacy progress view: `user_id` is the trainee name and `stage` the encoded title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressRecord {
    pub id: String,
    pub user_id: String,
    pub stage: String,
    pub created_at: NaiveDate,
}

impl From<&TrainingPeriod> for ProgressRecord {
    fn from(period: &TrainingPeriod) -> Self {
        Self {
            id: period.id.clone(),
            user_id: period.trainee_name.clone(),
            stage: period.title(),
            created_at: period.start,
        }
    }
}

/// Request body for `POST /api/progress`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProgressRequest {
    pub user_id: String,
    pub stage: String,
}

/// Periods sharing one depot, for list display.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DepotGroup {
    pub depot: Option<String>,
    pub periods: Vec<TrainingPeriod>,
}
