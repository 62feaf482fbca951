//! # Transfer Engine
//!
//! Moves stock between businesses. The source product is always decremented
//! under the stock guard; the destination is incremented only when the
//! request names a product there. Movement and audit record land in one
//! transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Transfer, One Transaction                        │
//! │                                                                         │
//! │  check quantity > 0, destination business exists and is distinct        │
//! │       │                                                                 │
//! │       ▼  pool.begin()                                                   │
//! │  guarded decrement on source product (short stock aborts)               │
//! │  stock.low outbox event if the source fell to its alert threshold       │
//! │  increment destination product, when one is named                       │
//! │  insert the stock_transfers audit row                                   │
//! │       │                                                                 │
//! │       ▼  commit                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::pool::Database;
use crate::repository::{business, outbox, product, transfer};
use shopkit_core::{
    outbox_kind, Actor, CoreError, FieldError, Permission, StockTransfer, ValidationError,
};

/// A stock movement request between two businesses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_business_id: String,
    pub source_product_id: String,
    /// Order the transferred goods originally arrived through, if tracked.
    pub source_order_id: Option<String>,
    pub dest_business_id: String,
    /// Destination product to credit. When absent the transfer is
    /// record-only on the destination side.
    pub dest_product_id: Option<String>,
    pub quantity: i64,
}

/// Executes a stock transfer atomically.
///
/// ## Errors
/// * `StockInsufficient` - the source product cannot cover the quantity
/// * `NotFound` - source product, destination business or destination
///   product missing (or owned by the wrong business)
/// * `Validation` - non-positive quantity, or source and destination are
///   the same business
pub async fn transfer_stock(
    db: &Database,
    actor: &Actor,
    request: TransferRequest,
) -> EngineResult<StockTransfer> {
    actor.require(Permission::TransferStock)?;

    let mut errors = Vec::new();
    if request.quantity <= 0 {
        errors.push(FieldError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if request.source_business_id == request.dest_business_id {
        errors.push(FieldError::InvalidFormat {
            field: "dest_business_id".to_string(),
            reason: "destination must differ from source".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ValidationError::invalid(errors).into());
    }

    let now = Utc::now();
    let transfer_id = transfer::generate_transfer_id();

    debug!(
        transfer_id = %transfer_id,
        source = %request.source_business_id,
        dest = %request.dest_business_id,
        product_id = %request.source_product_id,
        quantity = request.quantity,
        "Transferring stock"
    );

    let mut tx = db.pool().begin().await?;

    if !business::exists(&mut tx, &request.dest_business_id).await? {
        return Err(CoreError::not_found("Business", request.dest_business_id).into());
    }

    let level = product::decrement_stock(
        &mut tx,
        &request.source_business_id,
        &request.source_product_id,
        request.quantity,
    )
    .await?;

    if level.is_low() {
        outbox::enqueue(
            &mut tx,
            &request.source_business_id,
            outbox_kind::STOCK_LOW,
            &json!({
                "product_id": request.source_product_id,
                "product_name": level.name,
                "stock_qty": level.stock_qty,
                "alert_qty": level.alert_qty,
            }),
        )
        .await?;
    }

    if let Some(dest_product_id) = &request.dest_product_id {
        product::increment_stock(
            &mut tx,
            &request.dest_business_id,
            dest_product_id,
            request.quantity,
        )
        .await?;
    }

    let record = StockTransfer {
        id: transfer_id,
        source_business_id: request.source_business_id,
        source_product_id: request.source_product_id,
        source_order_id: request.source_order_id,
        dest_business_id: request.dest_business_id,
        dest_product_id: request.dest_product_id,
        quantity: request.quantity,
        created_at: now,
    };
    transfer::insert_transfer(&mut tx, &record).await?;

    tx.commit().await?;

    info!(
        transfer_id = %record.id,
        quantity = record.quantity,
        "Stock transferred"
    );

    Ok(record)
}

// =============================================================================
// Unit Tests
// =============================================================================
