//! # Order Repository
//!
//! Database operations for purchase orders and their line items.
//!
//! The order lifecycle (draft → sent → confirmed → received → completed)
//! is enforced by `shopkit_core::lifecycle::OrderStatus`; the receiving
//! engine drives it. This module only stores and fetches rows, plus the
//! guarded receipt accumulator below.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopkit_core::{Order, OrderItem, OrderStatus};

/// Repository for purchase order database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = OrderRepository::new(pool);
///
/// let order = repo.get_by_id("biz-1", "ord-1").await?;
/// let items = repo.get_items("ord-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order by ID, scoped to one business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, business_id, supplier_id, status, total_cents,
                   ordered_on, expected_on, created_at, updated_at
            FROM orders
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Lists orders of a business, newest first.
    pub async fn list_for_business(&self, business_id: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, business_id, supplier_id, status, total_cents,
                   ordered_on, expected_on, created_at, updated_at
            FROM orders
            WHERE business_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets the line items of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, quantity, unit_price_cents, received_qty
            FROM order_items
            WHERE order_id = ?
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Fetches an order scoped to a business, inside a caller-owned transaction.
pub(crate) async fn get_scoped(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, business_id, supplier_id, status, total_cents,
               ordered_on, expected_on, created_at, updated_at
        FROM orders
        WHERE id = ? AND business_id = ?
        "#,
    )
    .bind(id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// Inserts an order row inside a caller-owned transaction.
pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, business_id, supplier_id, status, total_cents,
                            ordered_on, expected_on, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.id)
    .bind(&order.business_id)
    .bind(&order.supplier_id)
    .bind(order.status)
    .bind(order.total_cents)
    .bind(order.ordered_on)
    .bind(order.expected_on)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts an order line item inside a caller-owned transaction.
pub(crate) async fn insert_order_item(
    conn: &mut SqliteConnection,
    item: &OrderItem,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (id, order_id, product_id, quantity,
                                 unit_price_cents, received_qty)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.received_qty)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Fetches order items inside a caller-owned transaction.
pub(crate) async fn items_for(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price_cents, received_qty
        FROM order_items
        WHERE order_id = ?
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Fetches a single order item, scoped to its order.
pub(crate) async fn get_item(
    conn: &mut SqliteConnection,
    order_id: &str,
    item_id: &str,
) -> DbResult<Option<OrderItem>> {
    let item = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, quantity, unit_price_cents, received_qty
        FROM order_items
        WHERE id = ? AND order_id = ?
        "#,
    )
    .bind(item_id)
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Updates an order's lifecycle status.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    order_id: &str,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Order", order_id));
    }

    Ok(())
}

/// Accumulates a receipt on an order line, capped at the ordered quantity.
///
/// The cap sits in the WHERE clause, so the add and the check are one
/// statement.
///
/// ## Returns
/// * `Ok(true)` - receipt applied
/// * `Ok(false)` - the line would overshoot `quantity`; nothing written
pub(crate) async fn add_received(
    conn: &mut SqliteConnection,
    order_item_id: &str,
    quantity: i64,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE order_items
        SET received_qty = received_qty + ?
        WHERE id = ? AND received_qty + ? <= quantity
        "#,
    )
    .bind(quantity)
    .bind(order_item_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Helper to generate a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new order item ID.
pub fn generate_order_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
