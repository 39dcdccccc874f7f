//! Trainee model.

use serde::{Deserialize, Serialize};

use super::TrainingPeriod;

/// A person undergoing onboarding. Names are unique ignoring case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trainee {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

/// Request body for registering a trainee without a period yet.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTraineeRequest {
    pub name: String,
}

/// Everything the detail screen shows in its header.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraineeSummary {
    pub trainee: Trainee,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<TrainingPeriod>,
    pub checklist_completed: usize,
    pub checklist_total: usize,
}
