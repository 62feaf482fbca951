//! # Stock Transfer Repository
//!
//! Persistence for inter-business transfer records. The stock movements
//! themselves happen in the transfer engine; the rows here are the audit
//! trail and always persist alongside the movement, in the same transaction.

use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::error::DbResult;
use shopkit_core::StockTransfer;

/// Repository for stock transfer records.
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: SqlitePool,
}

impl TransferRepository {
    /// Creates a new TransferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransferRepository { pool }
    }

    /// Fetches one transfer visible to a business (as source or destination).
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<StockTransfer>> {
        let transfer = sqlx::query_as::<_, StockTransfer>(
            r#"
            SELECT id, source_business_id, source_product_id, source_order_id,
                   dest_business_id, dest_product_id, quantity, created_at
            FROM stock_transfers
            WHERE id = ? AND (source_business_id = ? OR dest_business_id = ?)
            "#,
        )
        .bind(id)
        .bind(business_id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transfer)
    }

    /// Lists transfers that moved stock out of a business, newest first.
    pub async fn list_outgoing(&self, business_id: &str) -> DbResult<Vec<StockTransfer>> {
        let transfers = sqlx::query_as::<_, StockTransfer>(
            r#"
            SELECT id, source_business_id, source_product_id, source_order_id,
                   dest_business_id, dest_product_id, quantity, created_at
            FROM stock_transfers
            WHERE source_business_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transfers)
    }

    /// Lists transfers that moved stock into a business, newest first.
    pub async fn list_incoming(&self, business_id: &str) -> DbResult<Vec<StockTransfer>> {
        let transfers = sqlx::query_as::<_, StockTransfer>(
            r#"
            SELECT id, source_business_id, source_product_id, source_order_id,
                   dest_business_id, dest_product_id, quantity, created_at
            FROM stock_transfers
            WHERE dest_business_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(transfers)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Inserts a transfer record inside a caller-owned transaction.
pub(crate) async fn insert_transfer(
    conn: &mut SqliteConnection,
    transfer: &StockTransfer,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_transfers (id, source_business_id, source_product_id,
                                     source_order_id, dest_business_id,
                                     dest_product_id, quantity, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&transfer.id)
    .bind(&transfer.source_business_id)
    .bind(&transfer.source_product_id)
    .bind(&transfer.source_order_id)
    .bind(&transfer.dest_business_id)
    .bind(&transfer.dest_product_id)
    .bind(transfer.quantity)
    .bind(transfer.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Helper to generate a new transfer ID.
pub fn generate_transfer_id() -> String {
    Uuid::new_v4().to_string()
}
