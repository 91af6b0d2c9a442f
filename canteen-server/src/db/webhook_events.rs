//! Webhook idempotency guard
//!
//! INSERT first and check rows_affected, which eliminates the TOCTOU race
//! a check-then-insert would have.

use sqlx::SqlitePool;

/// Record an event id. Returns `false` if the event was already processed.
pub async fn record(
    pool: &SqlitePool,
    event_id: &str,
    event_type: &str,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO processed_webhook_events (event_id, event_type, processed_at)
         VALUES (?1, ?2, ?3) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(event_type)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
