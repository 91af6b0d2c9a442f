//! Database module
//!
//! Handles SQLite connection pool and migrations.

pub mod canteens;
pub mod menu_items;
pub mod orders;
pub mod otp_codes;
pub mod refresh_tokens;
pub mod users;
pub mod webhook_events;

use shared::error::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::str::FromStr;

/// Open the SQLite pool (WAL mode) and apply migrations
pub async fn connect(db_path: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
        .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("foreign_keys", "ON")
        .optimize_on_close(true, None);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

    // Wait up to 5s on write contention instead of failing immediately
    sqlx::query("PRAGMA busy_timeout = 5000;")
        .execute(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to set busy_timeout: {e}")))?;

    tracing::info!("Database connection established (SQLite WAL, busy_timeout=5000ms)");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
    tracing::info!("Database migrations applied");

    Ok(pool)
}

#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    pool
}

// Foreign keys are enforced in tests too, so rows referencing users or
// canteens need their parents in place first.

#[cfg(test)]
pub async fn seed_user(pool: &SqlitePool, id: &str, email: &str) {
    users::insert(
        pool,
        &users::NewUser {
            id,
            name: "Asha",
            email,
            phone: None,
            hashed_password: "hash",
            role: "student",
            is_approved: true,
            created_at: 1,
        },
    )
    .await
    .expect("seed user");
}

#[cfg(test)]
pub async fn seed_canteen(pool: &SqlitePool, id: &str, name: &str) {
    canteens::insert(
        pool,
        id,
        &shared::models::CanteenCreate {
            name: name.into(),
            description: None,
            location: None,
            owner_id: None,
        },
        1,
    )
    .await
    .expect("seed canteen");
}
