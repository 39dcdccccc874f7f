//! Training report over a date range, with CSV rendering.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::codec;
use crate::errors::AppError;
use crate::models::{DailyDetail, TrainingPeriod};

const CSV_HEADER: [&str; 6] = ["Trainee", "Depot", "Vehicle", "Training Date", "Topic", "Notes"];

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::Validation(format!(
                "Report range start {} is after its end {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// One training day of one trainee.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub trainee: String,
    pub depot: String,
    pub vehicle: String,
    pub date: NaiveDate,
    pub topic: String,
    pub notes: String,
}

/// Rows for every period day inside `range`, periods in the given order and
/// days ascending within each period. `details` is keyed by
/// [`codec::name_key`]. Fails with `NoData` when nothing falls in range.
pub fn build_report(
    periods: &[TrainingPeriod],
    details: &HashMap<String, DailyDetail>,
    range: DateRange,
) -> Result<Vec<ReportRow>, AppError> {
    let mut rows = Vec::new();

    for period in periods {
        let detail = details.get(&codec::name_key(&period.trainee_name));
        for (day, date) in codec::period_days(period.start) {
            if !range.contains(date) {
                continue;
            }
            let entry = detail.and_then(|d| d.entry_for(day, date));
            rows.push(ReportRow {
                trainee: period.trainee_name.clone(),
                depot: period.depot.clone().unwrap_or_default(),
                vehicle: period.vehicle.clone().unwrap_or_default(),
                date,
                topic: entry.map(|e| e.topic.clone()).unwrap_or_default(),
                notes: entry.map(|e| e.notes.clone()).unwrap_or_default(),
            });
        }
    }

    if rows.is_empty() {
        return Err(AppError::NoData(format!(
            "No training data between {} and {}",
            range.from, range.to
        )));
    }

    tracing::debug!(rows = rows.len(), "Built training report");
    Ok(rows)
}

/// Render rows as CSV: header first, every field quoted, dates as dd/mm/yyyy.
pub fn to_csv(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    push_record(&mut out, CSV_HEADER);
    for row in rows {
        let date = row.date.format("%d/%m/%Y").to_string();
        push_record(
            &mut out,
            [
                row.trainee.as_str(),
                row.depot.as_str(),
                row.vehicle.as_str(),
                date.as_str(),
                row.topic.as_str(),
                row.notes.as_str(),
            ],
        );
    }
    out
}

/// Download name for a report generated on `today`.
pub fn csv_filename(today: NaiveDate) -> String {
    format!("training_report_{}.csv", today.format("%Y%m%d"))
}

fn push_record<const N: usize>(out: &mut String, fields: [&str; N]) {
    let quoted: Vec<String> = fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect();
    out.push_str(&quoted.join(","));
    out.push('\n');
}
