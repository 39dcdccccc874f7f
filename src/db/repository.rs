//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use super::{DetailStore, PeriodStore};
use crate::codec;
use crate::errors::AppError;
use crate::models::{
    is_checklist_item, ChecklistState, DailyDetail, DayEntry, DayKey, DetailField, NewPeriod,
    Trainee, TrainingPeriod,
};

const PERIOD_COLUMNS: &str = r#"SELECT p.id, t.name, p.depot, p.vehicle, p.start_date, p.end_date
    FROM periods p JOIN trainees t ON t.id = p.trainee_id"#;

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Id of the trainee with this name, or `NotFound`.
    async fn require_trainee_id(&self, name: &str) -> Result<String, AppError> {
        let row = sqlx::query("SELECT id FROM trainees WHERE name_key = ?")
            .bind(codec::name_key(name))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.get("id"))
            .ok_or_else(|| AppError::NotFound(format!("Trainee {} not found", name)))
    }
}

#[async_trait]
impl PeriodStore for Repository {
    async fn list_periods(&self) -> Result<Vec<TrainingPeriod>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY p.start_date, t.name_key", PERIOD_COLUMNS))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(period_from_row).collect())
    }

    async fn get_period(&self, name: &str) -> Result<Option<TrainingPeriod>, AppError> {
        let row = sqlx::query(&format!("{} WHERE t.name_key = ?", PERIOD_COLUMNS))
            .bind(codec::name_key(name))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(period_from_row))
    }

    async fn create_period(&self, period: &NewPeriod) -> Result<TrainingPeriod, AppError> {
        let name = codec::normalize_name(&period.trainee_name)?;
        let key = codec::name_key(&name);
        let now = Utc::now().to_rfc3339();
        let end = codec::derive_end(period.start);

        // Use a transaction so the trainee and period appear together
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query(
            r#"SELECT t.id, t.name, p.id AS period_id
               FROM trainees t LEFT JOIN periods p ON p.trainee_id = t.id
               WHERE t.name_key = ?"#,
        )
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await?;

        let (trainee_id, trainee_name) = match existing {
            Some(row) => {
                let period_id: Option<String> = row.get("period_id");
                if period_id.is_some() {
                    return Err(AppError::duplicate_trainee(&name));
                }
                (row.get::<String, _>("id"), row.get::<String, _>("name"))
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                sqlx::query(
                    "INSERT INTO trainees (id, name, name_key, created_at) VALUES (?, ?, ?, ?)",
                )
                .bind(&id)
                .bind(&name)
                .bind(&key)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| unique_violation_as_duplicate(e, &name))?;
                (id, name.clone())
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO periods (id, trainee_id, depot, vehicle, start_date, end_date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)"
        )
        .bind(&id)
        .bind(&trainee_id)
        .bind(&period.depot)
        .bind(&period.vehicle)
        .bind(period.start)
        .bind(end)
        .bind(&now)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation_as_duplicate(e, &name))?;

        tx.commit().await?;

        tracing::info!(trainee = %trainee_name, start = %period.start, "Created training period");

        Ok(TrainingPeriod {
            id,
            trainee_name,
            depot: period.depot.clone(),
            vehicle: period.vehicle.clone(),
            start: period.start,
            end,
        })
    }

    async fn delete_trainee(&self, name: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM trainees WHERE name_key = ?")
            .bind(codec::name_key(name))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(trainee = name, "Delete of unknown trainee ignored");
        } else {
            tracing::info!(trainee = name, "Deleted trainee and all training data");
        }
        Ok(())
    }

    async fn list_trainees(&self) -> Result<Vec<Trainee>, AppError> {
        let rows = sqlx::query("SELECT id, name, created_at FROM trainees ORDER BY name_key")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(trainee_from_row).collect())
    }

    async fn get_trainee(&self, name: &str) -> Result<Option<Trainee>, AppError> {
        let row = sqlx::query("SELECT id, name, created_at FROM trainees WHERE name_key = ?")
            .bind(codec::name_key(name))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(trainee_from_row))
    }

    async fn create_trainee(&self, name: &str) -> Result<Trainee, AppError> {
        let name = codec::normalize_name(name)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query("INSERT INTO trainees (id, name, name_key, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&name)
            .bind(codec::name_key(&name))
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| unique_violation_as_duplicate(e, &name))?;

        tracing::info!(trainee = %name, "Registered trainee");

        Ok(Trainee {
            id,
            name,
            created_at: now,
        })
    }
}

#[async_trait]
impl DetailStore for Repository {
    async fn get_checklist(&self, name: &str) -> Result<ChecklistState, AppError> {
        let rows = sqlx::query(
            r#"SELECT c.item, c.completed
               FROM checklist_items c JOIN trainees t ON t.id = c.trainee_id
               WHERE t.name_key = ?"#,
        )
        .bind(codec::name_key(name))
        .fetch_all(&self.pool)
        .await?;

        Ok(ChecklistState::from_stored(rows.iter().map(|row| {
            let completed: i32 = row.get("completed");
            (row.get::<String, _>("item"), completed != 0)
        })))
    }

    async fn set_checklist_item(
        &self,
        name: &str,
        item: &str,
        completed: bool,
    ) -> Result<ChecklistState, AppError> {
        if !is_checklist_item(item) {
            return Err(AppError::Validation(format!(
                "Unknown checklist item: {}",
                item
            )));
        }
        let trainee_id = self.require_trainee_id(name).await?;

        sqlx::query(
            r#"INSERT INTO checklist_items (trainee_id, item, completed, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(trainee_id, item)
               DO UPDATE SET completed = excluded.completed, updated_at = excluded.updated_at"#,
        )
        .bind(&trainee_id)
        .bind(item)
        .bind(completed as i32)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.get_checklist(name).await
    }

    async fn get_details(&self, name: &str) -> Result<DailyDetail, AppError> {
        let rows = sqlx::query(
            r#"SELECT d.day_key, d.topic, d.notes
               FROM daily_details d JOIN trainees t ON t.id = d.trainee_id
               WHERE t.name_key = ?"#,
        )
        .bind(codec::name_key(name))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(detail_from_row).collect())
    }

    async fn set_detail(
        &self,
        name: &str,
        day_key: DayKey,
        field: DetailField,
        value: &str,
    ) -> Result<DailyDetail, AppError> {
        let trainee_id = self.require_trainee_id(name).await?;

        // Only the named column is written; the other keeps its value
        let sql = match field {
            DetailField::Topic => {
                r#"INSERT INTO daily_details (trainee_id, day_key, topic, updated_at)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT(trainee_id, day_key)
                   DO UPDATE SET topic = excluded.topic, updated_at = excluded.updated_at"#
            }
            DetailField::Notes => {
                r#"INSERT INTO daily_details (trainee_id, day_key, notes, updated_at)
                   VALUES (?, ?, ?, ?)
                   ON CONFLICT(trainee_id, day_key)
                   DO UPDATE SET notes = excluded.notes, updated_at = excluded.updated_at"#
            }
        };

        sqlx::query(sql)
            .bind(&trainee_id)
            .bind(day_key.to_string())
            .bind(value)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        self.get_details(name).await
    }

    async fn all_details(&self) -> Result<HashMap<String, DailyDetail>, AppError> {
        let rows = sqlx::query(
            r#"SELECT t.name_key, d.day_key, d.topic, d.notes
               FROM daily_details d JOIN trainees t ON t.id = d.trainee_id"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut details: HashMap<String, DailyDetail> = HashMap::new();
        for row in &rows {
            if let Some((key, entry)) = detail_from_row(row) {
                details
                    .entry(row.get("name_key"))
                    .or_default()
                    .insert(key, entry);
            }
        }
        Ok(details)
    }
}

// Helper functions for row conversion

fn unique_violation_as_duplicate(err: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            tracing::warn!(trainee = name, "Rejected duplicate trainee at storage");
            return AppError::duplicate_trainee(name);
        }
    }
    AppError::from(err)
}

fn trainee_from_row(row: &sqlx::sqlite::SqliteRow) -> Trainee {
    Trainee {
        id: row.get("id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn period_from_row(row: &sqlx::sqlite::SqliteRow) -> TrainingPeriod {
    TrainingPeriod {
        id: row.get("id"),
        trainee_name: row.get("name"),
        depot: row.get("depot"),
        vehicle: row.get("vehicle"),
        start: row.get("start_date"),
        end: row.get("end_date"),
    }
}

fn detail_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<(DayKey, DayEntry)> {
    let raw_key: String = row.get("day_key");
    match raw_key.parse::<DayKey>() {
        Ok(key) => Some((
            key,
            DayEntry {
                topic: row.get("topic"),
                notes: row.get("notes"),
            },
        )),
        Err(_) => {
            tracing::warn!(day_key = %raw_key, "Skipping daily detail with unreadable key");
            None
        }
    }
}
