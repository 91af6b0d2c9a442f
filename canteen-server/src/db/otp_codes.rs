//! Verification code storage
//!
//! One row per contact+purpose. A fresh send resets attempts; resends
//! carry the resend counter forward so the per-session cap holds across
//! regenerated codes.

use shared::models::OtpCode;
use sqlx::SqlitePool;

pub async fn upsert(
    pool: &SqlitePool,
    contact: &str,
    purpose: &str,
    code_hash: &str,
    resend_count: i64,
    expires_at: i64,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO otp_codes (contact, purpose, code, attempts, resend_count, expires_at, last_sent_at, created_at)
         VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?6)
         ON CONFLICT (contact, purpose) DO UPDATE SET
            code = ?3, attempts = 0, resend_count = ?4, expires_at = ?5, last_sent_at = ?6",
    )
    .bind(contact)
    .bind(purpose)
    .bind(code_hash)
    .bind(resend_count)
    .bind(expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find(
    pool: &SqlitePool,
    contact: &str,
    purpose: &str,
) -> Result<Option<OtpCode>, sqlx::Error> {
    sqlx::query_as::<_, OtpCode>(
        "SELECT * FROM otp_codes WHERE contact = ?1 AND purpose = ?2",
    )
    .bind(contact)
    .bind(purpose)
    .fetch_optional(pool)
    .await
}

pub async fn increment_attempts(
    pool: &SqlitePool,
    contact: &str,
    purpose: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE otp_codes SET attempts = attempts + 1 WHERE contact = ?1 AND purpose = ?2",
    )
    .bind(contact)
    .bind(purpose)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &SqlitePool, contact: &str, purpose: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM otp_codes WHERE contact = ?1 AND purpose = ?2")
        .bind(contact)
        .bind(purpose)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop codes that expired before the cutoff (periodic cleanup task)
pub async fn purge_expired(pool: &SqlitePool, cutoff: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < ?1")
        .bind(cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_upsert_resets_attempts() {
        let pool = test_pool().await;
        upsert(&pool, "a@campus.edu", "registration", "hash1", 0, 1000, 500)
            .await
            .unwrap();
        increment_attempts(&pool, "a@campus.edu", "registration")
            .await
            .unwrap();
        increment_attempts(&pool, "a@campus.edu", "registration")
            .await
            .unwrap();

        let record = find(&pool, "a@campus.edu", "registration")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.attempts, 2);

        // A fresh code supersedes the old one and clears attempts
        upsert(&pool, "a@campus.edu", "registration", "hash2", 1, 2000, 600)
            .await
            .unwrap();
        let record = find(&pool, "a@campus.edu", "registration")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.attempts, 0);
        assert_eq!(record.resend_count, 1);
        assert_eq!(record.code, "hash2");
    }

    #[tokio::test]
    async fn test_purposes_are_independent() {
        let pool = test_pool().await;
        upsert(&pool, "a@campus.edu", "registration", "h1", 0, 1000, 500)
            .await
            .unwrap();
        upsert(&pool, "a@campus.edu", "password_reset", "h2", 0, 1000, 500)
            .await
            .unwrap();

        delete(&pool, "a@campus.edu", "registration").await.unwrap();
        assert!(find(&pool, "a@campus.edu", "registration")
            .await
            .unwrap()
            .is_none());
        assert!(find(&pool, "a@campus.edu", "password_reset")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let pool = test_pool().await;
        upsert(&pool, "a@campus.edu", "registration", "h1", 0, 1000, 500)
            .await
            .unwrap();
        upsert(&pool, "b@campus.edu", "registration", "h2", 0, 5000, 500)
            .await
            .unwrap();

        let purged = purge_expired(&pool, 2000).await.unwrap();
        assert_eq!(purged, 1);
        assert!(find(&pool, "b@campus.edu", "registration")
            .await
            .unwrap()
            .is_some());
    }
}
