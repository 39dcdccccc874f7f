//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for trainees, periods, checklists and daily
//! details. Child rows reference their trainee with `ON DELETE CASCADE`, so
//! removing a trainee removes everything recorded for them.

mod repository;
mod store;

pub use repository::*;
pub use store::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Create tables and indexes if they don't exist.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // name_key is the lowercased name; its UNIQUE constraint is the real
    // duplicate-trainee guard, the API-level check only gives a nicer error.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trainees (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS periods (
            id TEXT PRIMARY KEY,
            trainee_id TEXT NOT NULL UNIQUE REFERENCES trainees(id) ON DELETE CASCADE,
            depot TEXT,
            vehicle TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checklist_items (
            trainee_id TEXT NOT NULL REFERENCES trainees(id) ON DELETE CASCADE,
            item TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (trainee_id, item)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_details (
            trainee_id TEXT NOT NULL REFERENCES trainees(id) ON DELETE CASCADE,
            day_key TEXT NOT NULL,
            topic TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL,
            PRIMARY KEY (trainee_id, day_key)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_periods_start_date ON periods(start_date);
        CREATE INDEX IF NOT EXISTS idx_periods_depot ON periods(depot);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
