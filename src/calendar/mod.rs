//! Calendar projection of training periods.
//!
//! Status is always derived from the day passed in, so it is recomputed on
//! every request and never stored with the period.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::codec;
use crate::models::{DepotGroup, TrainingPeriod};

/// Where a period sits relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PeriodStatus {
    Upcoming,
    Active,
    Past,
}

impl PeriodStatus {
    /// Colour the dashboard paints this status with.
    pub fn color(&self) -> &'static str {
        match self {
            PeriodStatus::Past => "red",
            PeriodStatus::Active => "yellow",
            PeriodStatus::Upcoming => "green",
        }
    }
}

/// Status of the window `[start, end]` (both days inclusive) on `today`.
pub fn status_at(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> PeriodStatus {
    if end < today {
        PeriodStatus::Past
    } else if start <= today {
        PeriodStatus::Active
    } else {
        PeriodStatus::Upcoming
    }
}

/// A period as the calendar widget renders it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub trainee_name: String,
    pub depot: Option<String>,
    pub vehicle: Option<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub all_day: bool,
    pub status: PeriodStatus,
    pub color: &'static str,
}

/// Map periods to calendar events as of `today`, keeping input order.
pub fn project(periods: &[TrainingPeriod], today: NaiveDate) -> Vec<CalendarEvent> {
    periods
        .iter()
        .map(|period| {
            let status = status_at(period.start, period.end, today);
            CalendarEvent {
                id: period.id.clone(),
                title: codec::encode(
                    &period.trainee_name,
                    period.depot.as_deref(),
                    period.vehicle.as_deref(),
                ),
                trainee_name: period.trainee_name.clone(),
                depot: period.depot.clone(),
                vehicle: period.vehicle.clone(),
                start: period.start,
                end: period.end,
                all_day: true,
                status,
                color: status.color(),
            }
        })
        .collect()
}

/// Group periods by depot. Groups are ordered by depot name (byte order,
/// records without a depot first); periods within a group by trainee name.
pub fn group_by_depot(periods: &[TrainingPeriod]) -> Vec<DepotGroup> {
    let mut groups: BTreeMap<Option<String>, Vec<TrainingPeriod>> = BTreeMap::new();
    for period in periods {
        groups
            .entry(period.depot.clone())
            .or_default()
            .push(period.clone());
    }

    groups
        .into_iter()
        .map(|(depot, mut periods)| {
            periods.sort_by(|a, b| a.trainee_name.cmp(&b.trainee_name));
            DepotGroup { depot, periods }
        })
        .collect()
}
