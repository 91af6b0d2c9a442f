//! User repository

use shared::models::User;
use sqlx::SqlitePool;

pub struct NewUser<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub hashed_password: &'a str,
    pub role: &'a str,
    pub is_approved: bool,
    pub created_at: i64,
}

pub async fn insert(pool: &SqlitePool, user: &NewUser<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users (id, name, email, phone, hashed_password, role, is_active, is_approved,
                            email_verified, grandfathered, canteen_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, 0, 0, NULL, ?8)",
    )
    .bind(user.id)
    .bind(user.name)
    .bind(user.email)
    .bind(user.phone)
    .bind(user.hashed_password)
    .bind(user.role)
    .bind(user.is_approved)
    .bind(user.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    phone: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET name = ?2, phone = ?3 WHERE id = ?1")
        .bind(id)
        .bind(name)
        .bind(phone)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn update_password(
    pool: &SqlitePool,
    id: &str,
    hashed_password: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = ?2 WHERE id = ?1")
        .bind(id)
        .bind(hashed_password)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn mark_email_verified(pool: &SqlitePool, email: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET email_verified = 1 WHERE email = ?1")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_active(pool: &SqlitePool, id: &str, active: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_active = ?2 WHERE id = ?1")
        .bind(id)
        .bind(active)
        .execute(pool)
        .await?;
    Ok(())
}

/// Approve a partner and attach them to their canteen
pub async fn approve_partner(
    pool: &SqlitePool,
    id: &str,
    canteen_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET is_approved = 1, canteen_id = ?2 WHERE id = ?1")
        .bind(id)
        .bind(canteen_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_role(pool: &SqlitePool, id: &str, role: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET role = ?2 WHERE id = ?1")
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn admin_exists(pool: &SqlitePool) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
