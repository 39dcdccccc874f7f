//! Storage contracts the domain logic is written against.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{
    ChecklistState, DailyDetail, DayKey, DetailField, NewPeriod, Trainee, TrainingPeriod,
};

/// Trainees and their training periods.
#[async_trait]
pub trait PeriodStore: Send + Sync {
    /// All periods, ordered by start day then trainee name.
    async fn list_periods(&self) -> Result<Vec<TrainingPeriod>, AppError>;

    /// The period of the trainee with this name (case-insensitive), if any.
    async fn get_period(&self, name: &str) -> Result<Option<TrainingPeriod>, AppError>;

    /// Store a new period, creating the trainee if needed. Fails with
    /// `DuplicateTrainee` when the trainee already has a period.
    async fn create_period(&self, period: &NewPeriod) -> Result<TrainingPeriod, AppError>;

    /// Remove a trainee with their period, checklist and daily details.
    /// Removing an unknown name is not an error.
    async fn delete_trainee(&self, name: &str) -> Result<(), AppError>;

    async fn list_trainees(&self) -> Result<Vec<Trainee>, AppError>;

    async fn get_trainee(&self, name: &str) -> Result<Option<Trainee>, AppError>;

    /// Register a trainee without a period. Fails with `DuplicateTrainee`
    /// when the name is taken.
    async fn create_trainee(&self, name: &str) -> Result<Trainee, AppError>;
}

/// Per-trainee checklist flags and daily topic/notes.
#[async_trait]
pub trait DetailStore: Send + Sync {
    /// Checklist of a trainee; all items unchecked when nothing is stored.
    async fn get_checklist(&self, name: &str) -> Result<ChecklistState, AppError>;

    async fn set_checklist_item(
        &self,
        name: &str,
        item: &str,
        completed: bool,
    ) -> Result<ChecklistState, AppError>;

    /// Daily entries of a trainee; empty when nothing is stored.
    async fn get_details(&self, name: &str) -> Result<DailyDetail, AppError>;

    async fn set_detail(
        &self,
        name: &str,
        day_key: DayKey,
        field: DetailField,
        value: &str,
    ) -> Result<DailyDetail, AppError>;

    /// Daily entries of every trainee, keyed by lowercased name.
    async fn all_details(&self) -> Result<HashMap<String, DailyDetail>, AppError>;
}
