//! Training report endpoint.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::{today, ApiQuery, ApiResponse};
use crate::db::{DetailStore, PeriodStore};
use crate::errors::AppError;
use crate::report::{self, DateRange};
use crate::AppState;

/// Output format of the report.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

/// Report query parameters.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub format: ReportFormat,
}

/// GET /api/report - Daily rows of every period between `from` and `to`.
pub async fn training_report(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ReportQuery>,
) -> Result<Response, AppError> {
    let range = DateRange::new(params.from, params.to)?;
    let periods = state.repo.list_periods().await?;
    let details = state.repo.all_details().await?;
    let rows = report::build_report(&periods, &details, range)?;

    match params.format {
        ReportFormat::Json => Ok(ApiResponse::new(rows).into_response()),
        ReportFormat::Csv => {
            let filename = report::csv_filename(today());
            tracing::info!(rows = rows.len(), %filename, "Exporting training report");
            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ];
            Ok((headers, report::to_csv(&rows)).into_response())
        }
    }
}
