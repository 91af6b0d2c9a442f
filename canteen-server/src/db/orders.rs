//! Order repository
//!
//! Orders and their line items are written in one transaction. Rows are
//! never deleted; cancellation and refunds are status updates.

use shared::models::{Order, OrderItem};
use sqlx::SqlitePool;

pub struct NewOrder<'a> {
    pub id: &'a str,
    pub order_number: &'a str,
    pub user_id: &'a str,
    pub canteen_id: &'a str,
    pub item_total: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total_amount: f64,
    pub status: &'a str,
    pub gateway_order_id: Option<&'a str>,
    pub special_instructions: Option<&'a str>,
    pub created_at: i64,
}

pub struct NewOrderItem<'a> {
    pub menu_item_id: &'a str,
    pub name: &'a str,
    pub unit_price: f64,
    pub quantity: i64,
    pub line_total: f64,
}

pub async fn insert(
    pool: &SqlitePool,
    order: &NewOrder<'_>,
    items: &[NewOrderItem<'_>],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, order_number, user_id, canteen_id, item_total, tax, delivery_fee,
                             total_amount, status, payment_status, gateway_order_id,
                             special_instructions, cancel_reason, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'pending', ?10, ?11, NULL, ?12, ?12)",
    )
    .bind(order.id)
    .bind(order.order_number)
    .bind(order.user_id)
    .bind(order.canteen_id)
    .bind(order.item_total)
    .bind(order.tax)
    .bind(order.delivery_fee)
    .bind(order.total_amount)
    .bind(order.status)
    .bind(order.gateway_order_id)
    .bind(order.special_instructions)
    .bind(order.created_at)
    .execute(&mut *tx)
    .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, menu_item_id, name, unit_price, quantity, line_total)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(order.id)
        .bind(item.menu_item_id)
        .bind(item.name)
        .bind(item.unit_price)
        .bind(item.quantity)
        .bind(item.line_total)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_gateway_order_id(
    pool: &SqlitePool,
    gateway_order_id: &str,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE gateway_order_id = ?1")
        .bind(gateway_order_id)
        .fetch_optional(pool)
        .await
}

pub async fn items(pool: &SqlitePool, order_id: &str) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = ?1 ORDER BY id")
        .bind(order_id)
        .fetch_all(pool)
        .await
}

pub async fn list_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = ?1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_canteen(
    pool: &SqlitePool,
    canteen_id: &str,
) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE canteen_id = ?1 ORDER BY created_at DESC",
    )
    .bind(canteen_id)
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    status: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn cancel(
    pool: &SqlitePool,
    id: &str,
    reason: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET status = 'cancelled', cancel_reason = ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(reason)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Mark an order paid and move it out of `pending`. The WHERE guard makes
/// the call idempotent: a replay touches zero rows.
pub async fn mark_paid(pool: &SqlitePool, id: &str, now: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = 'paid',
                           status = CASE WHEN status = 'pending' THEN 'placed' ELSE status END,
                           updated_at = ?2
         WHERE id = ?1 AND payment_status = 'pending'",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_refunded(pool: &SqlitePool, id: &str, now: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE orders SET payment_status = 'refunded', updated_at = ?2 WHERE id = ?1",
    )
    .bind(id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_canteen, seed_user, test_pool};

    async fn pool_with_refs() -> SqlitePool {
        let pool = test_pool().await;
        seed_user(&pool, "u1", "u1@campus.edu").await;
        seed_user(&pool, "u2", "u2@campus.edu").await;
        seed_canteen(&pool, "c1", "Annapurna").await;
        pool
    }

    fn new_order<'a>(id: &'a str, number: &'a str, status: &'a str) -> NewOrder<'a> {
        NewOrder {
            id,
            order_number: number,
            user_id: "u1",
            canteen_id: "c1",
            item_total: 120.0,
            tax: 6.0,
            delivery_fee: 20.0,
            total_amount: 146.0,
            status,
            gateway_order_id: Some("gw_1"),
            special_instructions: None,
            created_at: 100,
        }
    }

    fn line() -> NewOrderItem<'static> {
        NewOrderItem {
            menu_item_id: "m1",
            name: "Masala Dosa",
            unit_price: 45.0,
            quantity: 2,
            line_total: 90.0,
        }
    }

    #[tokio::test]
    async fn test_insert_with_items() {
        let pool = pool_with_refs().await;
        insert(&pool, &new_order("o1", "CC-20250801-000001", "pending"), &[line()])
            .await
            .unwrap();

        let order = find_by_id(&pool, "o1").await.unwrap().unwrap();
        assert_eq!(order.status, "pending");
        assert_eq!(order.payment_status, "pending");
        assert_eq!(order.total_amount, 146.0);

        let lines = items(&pool, "o1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].name, "Masala Dosa");
        assert_eq!(lines[0].line_total, 90.0);
    }

    #[tokio::test]
    async fn test_mark_paid_idempotent() {
        let pool = pool_with_refs().await;
        insert(&pool, &new_order("o1", "CC-20250801-000001", "pending"), &[line()])
            .await
            .unwrap();

        assert!(mark_paid(&pool, "o1", 200).await.unwrap());
        let order = find_by_id(&pool, "o1").await.unwrap().unwrap();
        assert_eq!(order.payment_status, "paid");
        assert_eq!(order.status, "placed");
        assert_eq!(order.updated_at, 200);

        // Replay does not double-advance
        assert!(!mark_paid(&pool, "o1", 300).await.unwrap());
        let order = find_by_id(&pool, "o1").await.unwrap().unwrap();
        assert_eq!(order.updated_at, 200);
    }

    #[tokio::test]
    async fn test_mark_paid_keeps_later_status() {
        let pool = pool_with_refs().await;
        insert(&pool, &new_order("o1", "CC-20250801-000001", "confirmed"), &[line()])
            .await
            .unwrap();

        assert!(mark_paid(&pool, "o1", 200).await.unwrap());
        let order = find_by_id(&pool, "o1").await.unwrap().unwrap();
        // Webhook arriving after the canteen confirmed must not regress status
        assert_eq!(order.status, "confirmed");
        assert_eq!(order.payment_status, "paid");
    }

    #[tokio::test]
    async fn test_cancel_keeps_row() {
        let pool = pool_with_refs().await;
        insert(&pool, &new_order("o1", "CC-20250801-000001", "placed"), &[line()])
            .await
            .unwrap();

        cancel(&pool, "o1", Some("changed my mind"), 250)
            .await
            .unwrap();
        let order = find_by_id(&pool, "o1").await.unwrap().unwrap();
        assert_eq!(order.status, "cancelled");
        assert_eq!(order.cancel_reason.as_deref(), Some("changed my mind"));
        // Items survive cancellation
        assert_eq!(items(&pool, "o1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_scopes_and_ordering() {
        let pool = pool_with_refs().await;
        let mut o1 = new_order("o1", "CC-20250801-000001", "placed");
        o1.created_at = 100;
        o1.gateway_order_id = Some("gw_1");
        let mut o2 = new_order("o2", "CC-20250801-000002", "placed");
        o2.created_at = 200;
        o2.user_id = "u2";
        o2.gateway_order_id = Some("gw_2");

        insert(&pool, &o1, &[line()]).await.unwrap();
        insert(&pool, &o2, &[line()]).await.unwrap();

        let mine = list_by_user(&pool, "u1").await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, "o1");

        let canteen = list_by_canteen(&pool, "c1").await.unwrap();
        assert_eq!(canteen.len(), 2);
        // Most recent first
        assert_eq!(canteen[0].id, "o2");

        assert_eq!(list_all(&pool).await.unwrap().len(), 2);

        let by_gw = find_by_gateway_order_id(&pool, "gw_2").await.unwrap();
        assert_eq!(by_gw.unwrap().id, "o2");
    }
}
