//! # Sale Repository
//!
//! Database operations for sales, their line items and payments.
//!
//! Row shapes only: settlement rules (status vs payments, ledger deltas)
//! live in `shopkit_core::settlement`, and the multi-table write path lives
//! in the checkout engine. Everything here either reads, or inserts single
//! rows inside a caller-owned transaction.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopkit_core::{Payment, Sale, SaleItem, SaleStatus};

/// Repository for sale database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = SaleRepository::new(pool);
///
/// let sale = repo.get_by_id("biz-1", "sale-1").await?;
/// let items = repo.get_items("sale-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to one business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, business_id, client_id, seller_id, status, total_cents,
                   created_at, updated_at, cancelled_at
            FROM sales
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists recent sales of a business, newest first.
    pub async fn list_for_business(&self, business_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, business_id, client_id, seller_id, status, total_cents,
                   created_at, updated_at, cancelled_at
            FROM sales
            WHERE business_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(business_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Lists open credit sales (pending or partial), newest first.
    ///
    /// ## Usage
    /// Collection follow-up: these are the sales with money outstanding on
    /// client accounts.
    pub async fn list_credit(&self, business_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, business_id, client_id, seller_id, status, total_cents,
                   created_at, updated_at, cancelled_at
            FROM sales
            WHERE business_id = ? AND status IN (?, ?)
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .bind(SaleStatus::Pending)
        .bind(SaleStatus::Partial)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets the line items of a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, quantity,
                   unit_price_cents, line_total_cents
            FROM sale_items
            WHERE sale_id = ?
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the payments of a sale, oldest first.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, sale_id, method, amount_cents, created_at, processed_at
            FROM payments
            WHERE sale_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Sums the payments recorded against a sale, in cents.
    pub async fn total_paid(&self, sale_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM payments WHERE sale_id = ?",
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Fetches a sale scoped to a business, inside a caller-owned transaction.
pub(crate) async fn get_scoped(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(
        r#"
        SELECT id, business_id, client_id, seller_id, status, total_cents,
               created_at, updated_at, cancelled_at
        FROM sales
        WHERE id = ? AND business_id = ?
        "#,
    )
    .bind(id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

/// Inserts a sale row inside a caller-owned transaction.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (id, business_id, client_id, seller_id, status, total_cents,
                           created_at, updated_at, cancelled_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.business_id)
    .bind(&sale.client_id)
    .bind(&sale.seller_id)
    .bind(sale.status)
    .bind(sale.total_cents)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .bind(sale.cancelled_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a sale line item inside a caller-owned transaction.
pub(crate) async fn insert_sale_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (id, sale_id, product_id, product_name, quantity,
                                unit_price_cents, line_total_cents)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.line_total_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts a payment row inside a caller-owned transaction.
pub(crate) async fn insert_payment(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payments (id, sale_id, method, amount_cents, created_at, processed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.sale_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(payment.created_at)
    .bind(payment.processed_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Fetches sale items inside a caller-owned transaction (restock on cancel).
pub(crate) async fn items_for(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, product_name, quantity,
               unit_price_cents, line_total_cents
        FROM sale_items
        WHERE sale_id = ?
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Fetches sale payments inside a caller-owned transaction.
pub(crate) async fn payments_for(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, sale_id, method, amount_cents, created_at, processed_at
        FROM payments
        WHERE sale_id = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(payments)
}

/// Updates a sale's settlement status.
pub(crate) async fn set_status(
    conn: &mut SqliteConnection,
    sale_id: &str,
    status: SaleStatus,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE sales SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now)
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

/// Moves a sale to cancelled and stamps `cancelled_at`.
pub(crate) async fn mark_cancelled(
    conn: &mut SqliteConnection,
    sale_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE sales SET status = ?, cancelled_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(SaleStatus::Cancelled)
    .bind(now)
    .bind(now)
    .bind(sale_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Sale", sale_id));
    }

    Ok(())
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new payment ID.
pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
