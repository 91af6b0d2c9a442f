//! Menu item repository

use shared::models::{MenuItem, MenuItemCreate, MenuItemUpdate};
use sqlx::SqlitePool;

pub async fn insert(
    pool: &SqlitePool,
    id: &str,
    canteen_id: &str,
    payload: &MenuItemCreate,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO menu_items (id, canteen_id, name, description, category, price, is_available, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7)",
    )
    .bind(id)
    .bind(canteen_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(payload.price)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as::<_, MenuItem>("SELECT * FROM menu_items WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Fetch several items at once for order creation. Order of the result is
/// unspecified; callers match rows back by id.
pub async fn find_many(pool: &SqlitePool, ids: &[String]) -> Result<Vec<MenuItem>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = (1..=ids.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("SELECT * FROM menu_items WHERE id IN ({placeholders})");
    let mut query = sqlx::query_as::<_, MenuItem>(&sql);
    for id in ids {
        query = query.bind(id);
    }
    query.fetch_all(pool).await
}

pub async fn list_by_canteen(
    pool: &SqlitePool,
    canteen_id: &str,
    category: Option<&str>,
) -> Result<Vec<MenuItem>, sqlx::Error> {
    match category {
        Some(cat) => {
            sqlx::query_as::<_, MenuItem>(
                "SELECT * FROM menu_items WHERE canteen_id = ?1 AND category = ?2 ORDER BY name",
            )
            .bind(canteen_id)
            .bind(cat)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, MenuItem>(
                "SELECT * FROM menu_items WHERE canteen_id = ?1 ORDER BY category, name",
            )
            .bind(canteen_id)
            .fetch_all(pool)
            .await
        }
    }
}

/// Case-insensitive substring search over available items
pub async fn search(pool: &SqlitePool, term: &str) -> Result<Vec<MenuItem>, sqlx::Error> {
    let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
    sqlx::query_as::<_, MenuItem>(
        "SELECT * FROM menu_items
         WHERE is_available = 1 AND (name LIKE ?1 ESCAPE '\\' OR description LIKE ?1 ESCAPE '\\')
         ORDER BY name",
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

pub async fn update(
    pool: &SqlitePool,
    id: &str,
    payload: &MenuItemUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE menu_items SET
            name = COALESCE(?2, name),
            description = COALESCE(?3, description),
            category = COALESCE(?4, category),
            price = COALESCE(?5, price),
            is_available = COALESCE(?6, is_available)
         WHERE id = ?1",
    )
    .bind(id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(payload.price)
    .bind(payload.is_available)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::models::CanteenCreate;

    async fn seed(pool: &SqlitePool) {
        crate::db::canteens::insert(
            pool,
            "c1",
            &CanteenCreate {
                name: "Annapurna".into(),
                description: None,
                location: None,
                owner_id: None,
            },
            1,
        )
        .await
        .unwrap();
    }

    fn item(name: &str, category: &str, price: f64) -> MenuItemCreate {
        MenuItemCreate {
            name: name.into(),
            description: None,
            category: Some(category.into()),
            price,
        }
    }

    #[tokio::test]
    async fn test_insert_and_list() {
        let pool = test_pool().await;
        seed(&pool).await;
        insert(&pool, "m1", "c1", &item("Masala Dosa", "tiffin", 45.0), 1)
            .await
            .unwrap();
        insert(&pool, "m2", "c1", &item("Filter Coffee", "drinks", 15.0), 2)
            .await
            .unwrap();

        let all = list_by_canteen(&pool, "c1", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let drinks = list_by_canteen(&pool, "c1", Some("drinks")).await.unwrap();
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].name, "Filter Coffee");
    }

    #[tokio::test]
    async fn test_search_skips_unavailable() {
        let pool = test_pool().await;
        seed(&pool).await;
        insert(&pool, "m1", "c1", &item("Masala Dosa", "tiffin", 45.0), 1)
            .await
            .unwrap();
        insert(&pool, "m2", "c1", &item("Rava Dosa", "tiffin", 50.0), 2)
            .await
            .unwrap();

        update(
            &pool,
            "m2",
            &MenuItemUpdate {
                name: None,
                description: None,
                category: None,
                price: None,
                is_available: Some(false),
            },
        )
        .await
        .unwrap();

        let hits = search(&pool, "dosa").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m1");
    }

    #[tokio::test]
    async fn test_find_many() {
        let pool = test_pool().await;
        seed(&pool).await;
        insert(&pool, "m1", "c1", &item("Idli", "tiffin", 30.0), 1)
            .await
            .unwrap();
        insert(&pool, "m2", "c1", &item("Vada", "tiffin", 25.0), 2)
            .await
            .unwrap();

        let found = find_many(&pool, &["m1".into(), "m2".into(), "mX".into()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        assert!(find_many(&pool, &[]).await.unwrap().is_empty());
    }
}
