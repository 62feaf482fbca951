//! # Product Repository
//!
//! Database operations for the product catalog, plus the category and
//! supplier rows products reference.
//!
//! ## Guarded Stock Mutations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 How the Stock Guard Works                               │
//! │                                                                         │
//! │  Checkout wants 4 units of product P (stock_qty = 10)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock_qty = stock_qty - 4                          │
//! │  WHERE id = P AND business_id = B AND stock_qty >= 4                    │
//! │       │                                                                 │
//! │       ├── rows_affected = 1 → stock is now 6, continue                  │
//! │       │                                                                 │
//! │       └── rows_affected = 0 → probe the row:                            │
//! │              • row exists  → StockInsufficient (with available qty)     │
//! │              • row missing → NotFound                                   │
//! │                                                                         │
//! │  The condition and the write are one statement, so two concurrent       │
//! │  checkouts can never both pass the check and drive stock negative.      │
//! │  The CHECK (stock_qty >= 0) constraint backstops the same invariant.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbResult, EngineError, EngineResult};
use shopkit_core::{Category, CoreError, Product, Supplier};

/// Repository for product catalog operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("biz-1", "prd-1").await?;
/// let low = repo.list_low_stock("biz-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, name, sku, category_id, supplier_id,
                stock_qty, initial_qty, alert_qty,
                purchase_price_cents, wholesale_price_cents, retail_price_cents,
                expires_on, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.business_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.stock_qty)
        .bind(product.initial_qty)
        .bind(product.alert_qty)
        .bind(product.purchase_price_cents)
        .bind(product.wholesale_price_cents)
        .bind(product.retail_price_cents)
        .bind(product.expires_on)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID, scoped to one business.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found in this business
    /// * `Ok(None)` - No such product here (even if the ID exists elsewhere)
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, business_id, name, sku, category_id, supplier_id,
                stock_qty, initial_qty, alert_qty,
                purchase_price_cents, wholesale_price_cents, retail_price_cents,
                expires_on, created_at, updated_at
            FROM products
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products of a business, sorted by name.
    pub async fn list_for_business(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, business_id, name, sku, category_id, supplier_id,
                stock_qty, initial_qty, alert_qty,
                purchase_price_cents, wholesale_price_cents, retail_price_cents,
                expires_on, created_at, updated_at
            FROM products
            WHERE business_id = ?
            ORDER BY name
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products at or below their alert threshold.
    ///
    /// Products with `alert_qty = 0` never alert.
    pub async fn list_low_stock(&self, business_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, business_id, name, sku, category_id, supplier_id,
                stock_qty, initial_qty, alert_qty,
                purchase_price_cents, wholesale_price_cents, retail_price_cents,
                expires_on, created_at, updated_at
            FROM products
            WHERE business_id = ? AND alert_qty > 0 AND stock_qty <= alert_qty
            ORDER BY stock_qty ASC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts products of a business (for diagnostics).
    pub async fn count_for_business(&self, business_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE business_id = ?")
            .bind(business_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a category row.
    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, business_id, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&category.id)
        .bind(&category.business_id)
        .bind(&category.name)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a supplier row.
    pub async fn insert_supplier(&self, supplier: &Supplier) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, business_id, name, phone, email, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.business_id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Stock snapshot taken right after a guarded mutation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StockLevel {
    pub(crate) name: String,
    pub(crate) stock_qty: i64,
    pub(crate) alert_qty: i64,
}

impl StockLevel {
    /// Mirrors [`Product::is_low_stock`]: at or below a positive threshold.
    pub(crate) fn is_low(&self) -> bool {
        self.alert_qty > 0 && self.stock_qty <= self.alert_qty
    }
}

/// Decrements stock with the availability check in the same statement.
///
/// ## Returns
/// * `Ok(StockLevel)` - the level after the decrement (for snapshots and
///   low-stock checks)
/// * `Err(Domain(StockInsufficient))` - not enough stock; nothing written
/// * `Err(Domain(NotFound))` - no such product in this business
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
    quantity: i64,
) -> EngineResult<StockLevel> {
    debug!(product_id = %product_id, quantity = %quantity, "Decrementing stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_qty = stock_qty - ?, updated_at = ?
        WHERE id = ? AND business_id = ? AND stock_qty >= ?
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .bind(business_id)
    .bind(quantity)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // The guard failed: either the row is missing or stock ran short.
        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock_qty FROM products WHERE id = ? AND business_id = ?")
                .bind(product_id)
                .bind(business_id)
                .fetch_optional(&mut *conn)
                .await?;

        return match available {
            Some(available) => Err(EngineError::Domain(CoreError::StockInsufficient {
                product_id: product_id.to_string(),
                requested: quantity,
                available,
            })),
            None => Err(CoreError::not_found("Product", product_id).into()),
        };
    }

    let level = sqlx::query_as::<_, StockLevel>(
        "SELECT name, stock_qty, alert_qty FROM products WHERE id = ? AND business_id = ?",
    )
    .bind(product_id)
    .bind(business_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(level)
}

/// Increments stock (restocks, receipts, transfer destinations).
pub(crate) async fn increment_stock(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
    quantity: i64,
) -> EngineResult<()> {
    debug!(product_id = %product_id, quantity = %quantity, "Incrementing stock");

    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_qty = stock_qty + ?, updated_at = ?
        WHERE id = ? AND business_id = ?
        "#,
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .bind(business_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::not_found("Product", product_id).into());
    }

    Ok(())
}

/// Checks product membership in a business, inside a caller-owned transaction.
pub(crate) async fn exists_in_business(
    conn: &mut SqliteConnection,
    business_id: &str,
    product_id: &str,
) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE id = ? AND business_id = ?")
            .bind(product_id)
            .bind(business_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

/// Checks supplier membership in a business, inside a caller-owned transaction.
pub(crate) async fn supplier_exists(
    conn: &mut SqliteConnection,
    business_id: &str,
    supplier_id: &str,
) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM suppliers WHERE id = ? AND business_id = ?")
            .bind(supplier_id)
            .bind(business_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(count > 0)
}

/// Helper to generate a new product ID.
///
/// ## Usage
/// ```rust,ignore
/// let id = generate_product_id();
/// let product = Product { id, ... };
/// ```
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use shopkit_core::CoreError;

    #[tokio::test]
    async fn test_get_by_id_is_business_scoped() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_business(&db, "biz-2").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 400).await;

        let repo = db.products();
        assert!(repo.get_by_id("biz-1", "prd-1").await.unwrap().is_some());
        assert!(repo.get_by_id("biz-2", "prd-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decrement_stock_applies_and_reports_level() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 3, 400).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let level = decrement_stock(&mut conn, "biz-1", "prd-1", 4).await.unwrap();

        assert_eq!(level.stock_qty, 6);
        assert!(!level.is_low());

        let level = decrement_stock(&mut conn, "biz-1", "prd-1", 4).await.unwrap();
        assert_eq!(level.stock_qty, 2);
        assert!(level.is_low());
    }

    #[tokio::test]
    async fn test_decrement_stock_insufficient() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 3, 0, 400).await;

        let mut conn = db.pool().acquire().await.unwrap();
        let err = decrement_stock(&mut conn, "biz-1", "prd-1", 5).await.unwrap_err();

        match err {
            EngineError::Domain(CoreError::StockInsufficient {
                requested,
                available,
                ..
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("expected StockInsufficient, got {other:?}"),
        }

        // Release the sole in-memory pool connection before re-acquiring below.
        drop(conn);

        // Nothing was written.
        let product = db.products().get_by_id("biz-1", "prd-1").await.unwrap().unwrap();
        assert_eq!(product.stock_qty, 3);
    }

    #[tokio::test]
    async fn test_decrement_stock_missing_product() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;

        let mut conn = db.pool().acquire().await.unwrap();
        let err = decrement_stock(&mut conn, "biz-1", "ghost", 1).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::NotFound { entity: "Product", .. })
        ));
    }

    #[tokio::test]
    async fn test_low_stock_list() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-low", 2, 5, 400).await;
        testutil::seed_product(&db, "biz-1", "prd-ok", 50, 5, 400).await;
        testutil::seed_product(&db, "biz-1", "prd-no-alert", 0, 0, 400).await;

        let low = db.products().list_low_stock("biz-1").await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "prd-low");
    }
}
