//! Canteen repository

use shared::models::{Canteen, CanteenCreate, CanteenUpdate};
use sqlx::SqlitePool;

pub async fn insert(
    pool: &SqlitePool,
    id: &str,
    payload: &CanteenCreate,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO canteens (id, name, description, location, is_open, owner_id, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.location)
    .bind(&payload.owner_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Canteen>, sqlx::Error> {
    sqlx::query_as::<_, Canteen>("SELECT * FROM canteens WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list(pool: &SqlitePool) -> Result<Vec<Canteen>, sqlx::Error> {
    sqlx::query_as::<_, Canteen>("SELECT * FROM canteens ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn name_exists(pool: &SqlitePool, name: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM canteens WHERE name = ?1")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Apply a partial update. COALESCE keeps existing values for absent fields.
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    payload: &CanteenUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE canteens SET
            name = COALESCE(?2, name),
            description = COALESCE(?3, description),
            location = COALESCE(?4, location),
            is_open = COALESCE(?5, is_open),
            owner_id = COALESCE(?6, owner_id)
         WHERE id = ?1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.location)
    .bind(payload.is_open)
    .bind(&payload.owner_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_user, test_pool};

    fn create(name: &str) -> CanteenCreate {
        CanteenCreate {
            name: name.into(),
            description: Some("North block".into()),
            location: Some("Building 4".into()),
            owner_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_list_update() {
        let pool = test_pool().await;
        seed_user(&pool, "u9", "owner@campus.edu").await;
        insert(&pool, "c1", &create("Annapurna"), 1).await.unwrap();
        insert(&pool, "c2", &create("Udupi Corner"), 2)
            .await
            .unwrap();

        let all = list(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by name
        assert_eq!(all[0].name, "Annapurna");

        assert!(name_exists(&pool, "Annapurna").await.unwrap());
        assert!(!name_exists(&pool, "Nonexistent").await.unwrap());

        update(
            &pool,
            "c1",
            &CanteenUpdate {
                name: None,
                description: None,
                location: None,
                is_open: Some(false),
                owner_id: Some("u9".into()),
            },
        )
        .await
        .unwrap();

        let c1 = find_by_id(&pool, "c1").await.unwrap().unwrap();
        assert!(!c1.is_open);
        assert_eq!(c1.owner_id.as_deref(), Some("u9"));
        // Untouched fields survive the partial update
        assert_eq!(c1.name, "Annapurna");
    }
}
