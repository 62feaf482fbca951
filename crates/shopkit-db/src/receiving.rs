//! # Receiving Engine
//!
//! Purchase orders and goods receipt. Administrative status moves go through
//! the lifecycle table in `shopkit-core`; receipts additionally move stock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order     draft                                                 │
//! │  mark_sent        draft → sent                                          │
//! │  confirm_order    sent → confirmed                                      │
//! │  receive_items    confirmed / partially_received                        │
//! │                     ├── per line: received_qty guard, stock increment   │
//! │                     └── all lines full? completed : partially_received  │
//! │  cancel_order     any non-terminal → cancelled (stock already           │
//! │                   received stays received)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EngineResult;
use crate::pool::Database;
use crate::repository::{order, product};
use shopkit_core::validation::{self, OrderDraft};
use shopkit_core::{
    Actor, CoreError, FieldError, Order, OrderItem, OrderStatus, Permission, ValidationError,
};

// =============================================================================
// Create Order
// =============================================================================

/// Creates a purchase order in `draft` with its line items.
///
/// The supplier and every referenced product must exist in the caller's
/// business; a missing reference aborts the whole order.
pub async fn create_order(db: &Database, actor: &Actor, draft: OrderDraft) -> EngineResult<Order> {
    actor.require(Permission::ManageOrders)?;

    let request = validation::validate_order(draft)?;

    let now = Utc::now();
    let order_id = order::generate_order_id();

    debug!(
        order_id = %order_id,
        business_id = %request.business_id,
        supplier_id = %request.supplier_id,
        lines = request.items.len(),
        "Creating purchase order"
    );

    let mut tx = db.pool().begin().await?;

    if !product::supplier_exists(&mut tx, &request.business_id, &request.supplier_id).await? {
        return Err(CoreError::not_found("Supplier", request.supplier_id).into());
    }
    for line in &request.items {
        if !product::exists_in_business(&mut tx, &request.business_id, &line.product_id).await? {
            return Err(CoreError::not_found("Product", line.product_id.clone()).into());
        }
    }

    let persisted = Order {
        id: order_id.clone(),
        business_id: request.business_id.clone(),
        supplier_id: request.supplier_id.clone(),
        status: OrderStatus::Draft,
        total_cents: request.total.cents(),
        ordered_on: request.ordered_on,
        expected_on: request.expected_on,
        created_at: now,
        updated_at: now,
    };
    order::insert_order(&mut tx, &persisted).await?;
    for line in &request.items {
        let item = OrderItem {
            id: order::generate_order_item_id(),
            order_id: order_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            received_qty: 0,
        };
        order::insert_order_item(&mut tx, &item).await?;
    }

    tx.commit().await?;

    info!(order_id = %persisted.id, total_cents = persisted.total_cents, "Order created");

    Ok(persisted)
}

// =============================================================================
// Administrative Transitions
// =============================================================================

/// Marks a draft order as sent to the supplier.
pub async fn mark_sent(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    order_id: &str,
) -> EngineResult<Order> {
    advance(db, actor, business_id, order_id, OrderStatus::Sent).await
}

/// Marks a sent order as confirmed by the supplier. Goods may be received
/// from here on.
pub async fn confirm_order(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    order_id: &str,
) -> EngineResult<Order> {
    advance(db, actor, business_id, order_id, OrderStatus::Confirmed).await
}

/// Cancels a non-terminal order. Stock received before cancellation stays
/// received.
pub async fn cancel_order(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    order_id: &str,
) -> EngineResult<Order> {
    advance(db, actor, business_id, order_id, OrderStatus::Cancelled).await
}

/// Applies one administrative transition under the lifecycle table.
async fn advance(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    order_id: &str,
    to: OrderStatus,
) -> EngineResult<Order> {
    actor.require(Permission::ManageOrders)?;

    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    let current = order::get_scoped(&mut tx, business_id, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;

    let next = current.status.transition(to)?;
    order::set_status(&mut tx, order_id, next, now).await?;

    tx.commit().await?;

    info!(order_id = %order_id, from = %current.status, to = %next, "Order status moved");

    Ok(Order {
        status: next,
        updated_at: now,
        ..current
    })
}

// =============================================================================
// Goods Receipt
// =============================================================================

/// One received quantity against one order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub order_item_id: String,
    pub quantity: i64,
}

/// Receives goods against a confirmed or partially received order.
///
/// Each line's cumulative received quantity may never exceed its ordered
/// quantity; an over-receipt aborts the whole receipt. Stock increments and
/// the resulting status land in the same transaction.
///
/// ## Returns
/// The order, now `partially_received` or `completed`.
pub async fn receive_items(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    order_id: &str,
    lines: &[ReceiptLine],
) -> EngineResult<Order> {
    actor.require(Permission::ManageOrders)?;

    if lines.is_empty() {
        return Err(ValidationError::invalid(vec![FieldError::required("lines")]).into());
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    let current = order::get_scoped(&mut tx, business_id, order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id))?;

    if !current.status.can_receive() {
        return Err(CoreError::bad_transition(
            "Order",
            current.status,
            OrderStatus::PartiallyReceived,
        )
        .into());
    }

    debug!(order_id = %order_id, lines = lines.len(), "Receiving goods");

    for (index, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::invalid(vec![FieldError::MustBePositive {
                field: format!("lines[{index}].quantity"),
            }])
            .into());
        }

        let item = order::get_item(&mut tx, order_id, &line.order_item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("OrderItem", line.order_item_id.clone()))?;

        if !order::add_received(&mut tx, &line.order_item_id, line.quantity).await? {
            return Err(ValidationError::invalid(vec![FieldError::OutOfRange {
                field: format!("lines[{index}].quantity"),
                min: 1,
                max: item.outstanding(),
            }])
            .into());
        }

        product::increment_stock(&mut tx, business_id, &item.product_id, line.quantity).await?;
    }

    let items = order::items_for(&mut tx, order_id).await?;
    let all_received = items.iter().all(OrderItem::is_fully_received);
    let next = current.status.transition(OrderStatus::after_receipt(all_received))?;
    order::set_status(&mut tx, order_id, next, now).await?;

    tx.commit().await?;

    info!(order_id = %order_id, status = %next, "Goods received");

    Ok(Order {
        status: next,
        updated_at: now,
        ..current
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::testutil;
    use shopkit_core::validation::OrderItemDraft;
    use shopkit_core::Role;

    fn manager() -> Actor {
        Actor::new("usr-1", "biz-1", Role::Manager)
    }

    fn order_draft(supplier_id: &str, items: Vec<OrderItemDraft>, total: f64) -> OrderDraft {
        OrderDraft {
            business_id: Some("biz-1".to_string()),
            supplier_id: Some(supplier_id.to_string()),
            total: Some(total),
            ordered_on: Some("2024-05-10".to_string()),
            expected_on: None,
            items,
        }
    }

    fn line(product_id: &str, quantity: f64, unit_price: f64) -> OrderItemDraft {
        OrderItemDraft {
            product_id: Some(product_id.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }

    async fn seed_confirmed_order(db: &Database, quantity: f64) -> Order {
        testutil::seed_business(db, "biz-1").await;
        testutil::seed_supplier(db, "biz-1", "sup-1").await;
        testutil::seed_product(db, "biz-1", "prd-1", 0, 0, 400).await;

        let order = create_order(
            db,
            &manager(),
            order_draft("sup-1", vec![line("prd-1", quantity, 2.0)], quantity * 2.0),
        )
        .await
        .unwrap();
        let order = mark_sent(db, &manager(), "biz-1", &order.id).await.unwrap();
        confirm_order(db, &manager(), "biz-1", &order.id).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_order_starts_draft() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_supplier(&db, "biz-1", "sup-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 0, 0, 400).await;

        let order = create_order(
            &db,
            &manager(),
            order_draft("sup-1", vec![line("prd-1", 10.0, 2.0)], 20.0),
        )
        .await
        .unwrap();

        assert_eq!(order.status, OrderStatus::Draft);
        assert_eq!(order.total_cents, 2_000);

        let items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 10);
        assert_eq!(items[0].received_qty, 0);
    }

    #[tokio::test]
    async fn test_create_order_unknown_supplier_rejected() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 0, 0, 400).await;

        let err = create_order(
            &db,
            &manager(),
            order_draft("sup-missing", vec![line("prd-1", 10.0, 2.0)], 20.0),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::NotFound {
                entity: "Supplier",
                ..
            })
        ));
        assert!(db.orders().list_for_business("biz-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_receive_partial_then_complete() {
        let db = testutil::test_db().await;
        let order = seed_confirmed_order(&db, 10.0).await;
        let items = db.orders().get_items(&order.id).await.unwrap();

        let receipt = vec![ReceiptLine {
            order_item_id: items[0].id.clone(),
            quantity: 5,
        }];
        let order = receive_items(&db, &manager(), "biz-1", &order.id, &receipt)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyReceived);

        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 5);

        let order = receive_items(&db, &manager(), "biz-1", &order.id, &receipt)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 10);

        let items = db.orders().get_items(&order.id).await.unwrap();
        assert!(items[0].is_fully_received());
    }

    #[tokio::test]
    async fn test_receive_before_confirmation_rejected() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_supplier(&db, "biz-1", "sup-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 0, 0, 400).await;

        let order = create_order(
            &db,
            &manager(),
            order_draft("sup-1", vec![line("prd-1", 10.0, 2.0)], 20.0),
        )
        .await
        .unwrap();
        let items = db.orders().get_items(&order.id).await.unwrap();

        let receipt = vec![ReceiptLine {
            order_item_id: items[0].id.clone(),
            quantity: 5,
        }];
        let err = receive_items(&db, &manager(), "biz-1", &order.id, &receipt)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_over_receipt_rejected_and_rolled_back() {
        let db = testutil::test_db().await;
        let order = seed_confirmed_order(&db, 10.0).await;
        let items = db.orders().get_items(&order.id).await.unwrap();

        let receipt = vec![ReceiptLine {
            order_item_id: items[0].id.clone(),
            quantity: 12,
        }];
        let err = receive_items(&db, &manager(), "biz-1", &order.id, &receipt)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));

        // Nothing moved: no received quantity, no stock.
        let items = db.orders().get_items(&order.id).await.unwrap();
        assert_eq!(items[0].received_qty, 0);
        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 0);
    }

    #[tokio::test]
    async fn test_cancel_keeps_received_stock() {
        let db = testutil::test_db().await;
        let order = seed_confirmed_order(&db, 10.0).await;
        let items = db.orders().get_items(&order.id).await.unwrap();

        receive_items(
            &db,
            &manager(),
            "biz-1",
            &order.id,
            &[ReceiptLine {
                order_item_id: items[0].id.clone(),
                quantity: 4,
            }],
        )
        .await
        .unwrap();

        let order = cancel_order(&db, &manager(), "biz-1", &order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);

        // No stock rollback on cancellation.
        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 4);

        // And the cancelled order receives nothing further.
        let err = receive_items(
            &db,
            &manager(),
            "biz-1",
            &order.id,
            &[ReceiptLine {
                order_item_id: items[0].id.clone(),
                quantity: 1,
            }],
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_seller_cannot_manage_orders() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        let seller = Actor::new("usr-2", "biz-1", Role::Seller);

        let err = create_order(
            &db,
            &seller,
            order_draft("sup-1", vec![line("prd-1", 1.0, 1.0)], 1.0),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Unauthorized { .. })
        ));
    }
}
