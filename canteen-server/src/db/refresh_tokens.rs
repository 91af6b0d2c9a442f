//! Refresh token storage

use shared::util::now_millis;
use sqlx::SqlitePool;

const REFRESH_TOKEN_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000; // 30 days

/// Create a new refresh token for a user
pub async fn create(pool: &SqlitePool, user_id: &str) -> Result<String, sqlx::Error> {
    let token_id = uuid::Uuid::new_v4().to_string();
    let expires_at = now_millis() + REFRESH_TOKEN_TTL_MS;

    sqlx::query("INSERT INTO refresh_tokens (id, user_id, expires_at) VALUES (?1, ?2, ?3)")
        .bind(&token_id)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(token_id)
}

/// Validate and rotate a refresh token. Returns (user_id, new_refresh_token).
pub async fn rotate(
    pool: &SqlitePool,
    refresh_token: &str,
) -> Result<Option<(String, String)>, sqlx::Error> {
    let row: Option<RefreshTokenRow> = sqlx::query_as(
        "SELECT user_id, expires_at, revoked FROM refresh_tokens WHERE id = ?1",
    )
    .bind(refresh_token)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Ok(None),
    };

    if row.revoked || row.expires_at < now_millis() {
        return Ok(None);
    }

    // Revoke the used token
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?1")
        .bind(refresh_token)
        .execute(pool)
        .await?;

    let new_token = create(pool, &row.user_id).await?;

    Ok(Some((row.user_id, new_token)))
}

/// Revoke a single refresh token (logout)
pub async fn revoke(pool: &SqlitePool, refresh_token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?1")
        .bind(refresh_token)
        .execute(pool)
        .await?;
    Ok(())
}

/// Revoke all refresh tokens for a user (logout everywhere, password change)
pub async fn revoke_all(pool: &SqlitePool, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ?1 AND NOT revoked")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    user_id: String,
    expires_at: i64,
    revoked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_user, test_pool};

    async fn pool_with_users() -> SqlitePool {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "u1@campus.edu").await;
        seed_user(&pool, "u2", "u2@campus.edu").await;
        pool
    }

    #[tokio::test]
    async fn test_rotation_revokes_used_token() {
        let pool = pool_with_users().await;
        let token = create(&pool, "u1").await.unwrap();

        let rotated = rotate(&pool, &token).await.unwrap();
        let (user_id, new_token) = rotated.unwrap();
        assert_eq!(user_id, "u1");
        assert_ne!(new_token, token);

        // Old token is dead after rotation
        assert!(rotate(&pool, &token).await.unwrap().is_none());
        // New token still works
        assert!(rotate(&pool, &new_token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_token_rejected() {
        let pool = test_pool().await;
        assert!(rotate(&pool, "no-such-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_all() {
        let pool = pool_with_users().await;
        let t1 = create(&pool, "u1").await.unwrap();
        let t2 = create(&pool, "u1").await.unwrap();
        let other = create(&pool, "u2").await.unwrap();

        revoke_all(&pool, "u1").await.unwrap();

        assert!(rotate(&pool, &t1).await.unwrap().is_none());
        assert!(rotate(&pool, &t2).await.unwrap().is_none());
        // Other users are untouched
        assert!(rotate(&pool, &other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_revoke_single() {
        let pool = pool_with_users().await;
        let t1 = create(&pool, "u1").await.unwrap();
        let t2 = create(&pool, "u1").await.unwrap();

        revoke(&pool, &t1).await.unwrap();
        assert!(rotate(&pool, &t1).await.unwrap().is_none());
        assert!(rotate(&pool, &t2).await.unwrap().is_some());
    }
}
