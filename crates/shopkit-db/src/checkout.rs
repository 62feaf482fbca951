//! # Checkout Engine
//!
//! Records sales, later payments against credit sales, and cancellations.
//! Every operation here is one sqlx transaction: an error on any line rolls
//! the whole document back.
//!
//! ## Sale Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      One Sale, One Transaction                          │
//! │                                                                         │
//! │  validate_sale(draft)        (pure, shopkit-core)                       │
//! │  check_consistency(...)      (pure, shopkit-core)                       │
//! │       │                                                                 │
//! │       ▼  pool.begin()                                                   │
//! │  resolve client ── inline profile: uniqueness probe, insert row,        │
//! │       │            account at 0, client.welcome outbox event            │
//! │  for each line: guarded stock decrement (a short line aborts all)       │
//! │  insert sale, items (frozen product names), payments (processed now)    │
//! │  client balance += total - paid + account-method paid                   │
//! │  stock.low outbox event per product at/below its alert threshold        │
//! │       │                                                                 │
//! │       ▼  commit                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Duplicate product references across lines are legal; their decrements
//! accumulate sequentially, each guarded against the running balance.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::json;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::pool::Database;
use crate::repository::product::StockLevel;
use crate::repository::{client, outbox, product, sale};
use shopkit_core::validation::{self, ClientProfile, ClientRef, SaleDraft, SalePayment};
use shopkit_core::{
    outbox_kind, settlement, Actor, Client, CoreError, FieldError, Money, Payment, PaymentMethod,
    Permission, Sale, SaleItem, SaleStatus, ValidationError,
};

// =============================================================================
// Create Sale
// =============================================================================

/// Records a complete sale: stock decrements, line items, payments, and the
/// client ledger effect, atomically.
///
/// ## Arguments
/// * `actor` - Authenticated caller; must hold the record-sales permission
/// * `draft` - Raw payload; validated and normalized before any I/O
///
/// ## Returns
/// The persisted sale.
///
/// ## Example
/// ```rust,ignore
/// let sale = checkout::create_sale(&db, &actor, draft).await?;
/// println!("sold for {} cents", sale.total_cents);
/// ```
pub async fn create_sale(db: &Database, actor: &Actor, draft: SaleDraft) -> EngineResult<Sale> {
    actor.require(Permission::RecordSales)?;

    let request = validation::validate_sale(draft)?;
    settlement::check_consistency(
        request.status,
        request.total,
        &request.payments,
        request.client.is_some(),
    )?;

    let now = Utc::now();
    let sale_id = sale::generate_sale_id();

    debug!(
        sale_id = %sale_id,
        business_id = %request.business_id,
        lines = request.items.len(),
        "Recording sale"
    );

    let mut tx = db.pool().begin().await?;

    let client_id = match &request.client {
        Some(ClientRef::Existing(id)) => {
            client::get_scoped(&mut tx, &request.business_id, id)
                .await?
                .ok_or_else(|| CoreError::not_found("Client", id.clone()))?;
            Some(id.clone())
        }
        Some(ClientRef::New(profile)) => {
            Some(create_client(&mut tx, &request.business_id, profile).await?)
        }
        None => None,
    };

    // Guarded decrements. The probe result doubles as the name snapshot for
    // the line item and as the low-stock check; for duplicate product
    // references the map keeps the last (lowest) level.
    let mut low_stock: BTreeMap<String, StockLevel> = BTreeMap::new();
    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let level =
            product::decrement_stock(&mut tx, &request.business_id, &line.product_id, line.quantity)
                .await?;
        if level.is_low() {
            low_stock.insert(line.product_id.clone(), level.clone());
        }
        items.push(SaleItem {
            id: sale::generate_sale_item_id(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            product_name: level.name,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total().cents(),
        });
    }

    let persisted = Sale {
        id: sale_id.clone(),
        business_id: request.business_id.clone(),
        client_id: client_id.clone(),
        seller_id: request.seller_id.clone(),
        status: request.status,
        total_cents: request.total.cents(),
        created_at: now,
        updated_at: now,
        cancelled_at: None,
    };
    sale::insert_sale(&mut tx, &persisted).await?;
    for item in &items {
        sale::insert_sale_item(&mut tx, item).await?;
    }
    for p in &request.payments {
        let payment = Payment {
            id: sale::generate_payment_id(),
            sale_id: sale_id.clone(),
            method: p.method,
            amount_cents: p.amount.cents(),
            created_at: now,
            processed_at: Some(now),
        };
        sale::insert_payment(&mut tx, &payment).await?;
    }

    if let Some(client_id) = &client_id {
        let claim = settlement::outstanding_claim(request.total, &request.payments);
        if !claim.is_zero() {
            client::adjust_balance(&mut tx, client_id, claim.cents(), now).await?;
        }
    }

    for (product_id, level) in &low_stock {
        outbox::enqueue(
            &mut tx,
            &request.business_id,
            outbox_kind::STOCK_LOW,
            &json!({
                "product_id": product_id,
                "product_name": level.name,
                "stock_qty": level.stock_qty,
                "alert_qty": level.alert_qty,
            }),
        )
        .await?;
    }

    tx.commit().await?;

    info!(
        sale_id = %persisted.id,
        status = %persisted.status,
        total_cents = persisted.total_cents,
        "Sale recorded"
    );

    Ok(persisted)
}

/// Creates a client row, its zero-balance account and the welcome event,
/// inside the enclosing sale transaction.
async fn create_client(
    conn: &mut SqliteConnection,
    business_id: &str,
    profile: &ClientProfile,
) -> EngineResult<String> {
    if let Some((field, value)) =
        client::find_duplicate(conn, business_id, &profile.phone, profile.email.as_deref()).await?
    {
        return Err(CoreError::DuplicateClient {
            field: field.to_string(),
            value,
        }
        .into());
    }

    let now = Utc::now();
    let new_client = Client {
        id: client::generate_client_id(),
        business_id: business_id.to_string(),
        name: profile.name.clone(),
        phone: profile.phone.clone(),
        email: profile.email.clone(),
        created_at: now,
    };
    client::insert_client(conn, &new_client).await?;
    client::open_account(conn, &new_client.id, now).await?;
    outbox::enqueue(
        conn,
        business_id,
        outbox_kind::CLIENT_WELCOME,
        &json!({
            "client_id": new_client.id,
            "name": new_client.name,
            "phone": new_client.phone,
            "email": new_client.email,
        }),
    )
    .await?;

    Ok(new_client.id)
}

// =============================================================================
// Record Payment
// =============================================================================

/// Records one later payment against a `pending` or `partial` sale.
///
/// The payment is stamped processed immediately, the sale status is
/// recomputed from the new paid sum, and the client balance absorbs the
/// ledger delta (zero for `account`-method payments).
///
/// ## Returns
/// The sale with its post-payment status.
pub async fn record_payment(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    sale_id: &str,
    method: PaymentMethod,
    amount: Money,
) -> EngineResult<Sale> {
    actor.require(Permission::RecordSales)?;

    if !amount.is_positive() {
        return Err(ValidationError::invalid(vec![FieldError::MustBePositive {
            field: "amount".to_string(),
        }])
        .into());
    }

    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    let current = sale::get_scoped(&mut tx, business_id, sale_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;

    let already_paid: Money = sale::payments_for(&mut tx, sale_id)
        .await?
        .iter()
        .map(Payment::amount)
        .sum();

    let next = settlement::accept_payment(current.status, current.total(), already_paid, amount)?;

    debug!(
        sale_id = %sale_id,
        method = %method,
        amount_cents = amount.cents(),
        next_status = %next,
        "Recording payment"
    );

    let payment = Payment {
        id: sale::generate_payment_id(),
        sale_id: sale_id.to_string(),
        method,
        amount_cents: amount.cents(),
        created_at: now,
        processed_at: Some(now),
    };
    sale::insert_payment(&mut tx, &payment).await?;
    sale::set_status(&mut tx, sale_id, next, now).await?;

    // Credit sales always carry a client (enforced at creation), so the
    // ledger delta has somewhere to land.
    if let Some(client_id) = &current.client_id {
        let delta = settlement::payment_ledger_delta(method, amount);
        if !delta.is_zero() {
            client::adjust_balance(&mut tx, client_id, delta.cents(), now).await?;
        }
    }

    tx.commit().await?;

    info!(sale_id = %sale_id, status = %next, "Payment recorded");

    Ok(Sale {
        status: next,
        updated_at: now,
        ..current
    })
}

// =============================================================================
// Cancel Sale
// =============================================================================

/// Cancels a sale: restocks every line, releases the outstanding claim from
/// the client balance, and stamps `cancelled_at`.
///
/// Legal from any non-cancelled status. Recorded payments stay recorded;
/// refunds are a manual process outside this system. Terminal.
pub async fn cancel_sale(
    db: &Database,
    actor: &Actor,
    business_id: &str,
    sale_id: &str,
) -> EngineResult<Sale> {
    actor.require(Permission::RecordSales)?;

    let now = Utc::now();
    let mut tx = db.pool().begin().await?;

    let current = sale::get_scoped(&mut tx, business_id, sale_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Sale", sale_id))?;

    if current.status.is_terminal() {
        return Err(EngineError::Domain(CoreError::bad_transition(
            "Sale",
            current.status,
            SaleStatus::Cancelled,
        )));
    }

    debug!(sale_id = %sale_id, from = %current.status, "Cancelling sale");

    for item in sale::items_for(&mut tx, sale_id).await? {
        product::increment_stock(&mut tx, business_id, &item.product_id, item.quantity).await?;
    }

    // The claim is recomputed over the payments recorded by now, so partial
    // settlements since creation release only what is still owed.
    if let Some(client_id) = &current.client_id {
        let payments: Vec<SalePayment> = sale::payments_for(&mut tx, sale_id)
            .await?
            .iter()
            .map(|p| SalePayment {
                method: p.method,
                amount: p.amount(),
            })
            .collect();
        let claim = settlement::outstanding_claim(current.total(), &payments);
        if !claim.is_zero() {
            client::adjust_balance(&mut tx, client_id, -claim.cents(), now).await?;
        }
    }

    sale::mark_cancelled(&mut tx, sale_id, now).await?;

    tx.commit().await?;

    info!(sale_id = %sale_id, "Sale cancelled");

    Ok(Sale {
        status: SaleStatus::Cancelled,
        cancelled_at: Some(now),
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
    use crate::testutil;
    use shopkit_core::validation::{SaleItemDraft, SalePaymentDraft};
    use shopkit_core::Role;

    fn seller() -> Actor {
        Actor::new("usr-1", "biz-1", Role::Seller)
    }

    fn item(product_id: &str, quantity: f64, unit_price: f64) -> SaleItemDraft {
        SaleItemDraft {
            product_id: Some(product_id.to_string()),
            quantity: Some(quantity),
            unit_price: Some(unit_price),
        }
    }

    fn cash(amount: f64) -> SalePaymentDraft {
        SalePaymentDraft {
            method: Some("cash".to_string()),
            amount: Some(amount),
        }
    }

    fn draft(
        status: &str,
        total: f64,
        items: Vec<SaleItemDraft>,
        payments: Vec<SalePaymentDraft>,
    ) -> SaleDraft {
        SaleDraft {
            business_id: Some("biz-1".to_string()),
            status: Some(status.to_string()),
            total: Some(total),
            items,
            payments,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_sale_decrements_stock_and_freezes_names() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 400).await;

        let sale = create_sale(
            &db,
            &seller(),
            draft("paid", 16.0, vec![item("prd-1", 4.0, 4.0)], vec![cash(16.0)]),
        )
        .await
        .unwrap();

        assert_eq!(sale.status, SaleStatus::Paid);
        assert_eq!(sale.total_cents, 1_600);

        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 6);

        let items = db.sales().get_items(&sale.id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Product prd-1");
        assert_eq!(items[0].line_total_cents, 1_600);

        let payments = db.sales().get_payments(&sale.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert!(payments[0].processed_at.is_some());
    }

    #[tokio::test]
    async fn test_pending_sale_debits_client_account() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;
        testutil::seed_client(&db, "biz-1", "cli-1", "555-0001").await;

        let mut payload = draft("pending", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![]);
        payload.client_id = Some("cli-1".to_string());

        let sale = create_sale(&db, &seller(), payload).await.unwrap();
        assert_eq!(sale.client_id.as_deref(), Some("cli-1"));
        assert_eq!(sale.status, SaleStatus::Pending);

        let account = db.clients().get_account("cli-1").await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 500);
    }

    #[tokio::test]
    async fn test_partial_without_client_is_rejected() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;

        let err = create_sale(
            &db,
            &seller(),
            draft("partial", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![cash(2.0)]),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_short_stock_aborts_whole_sale() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 100).await;
        testutil::seed_product(&db, "biz-1", "prd-2", 1, 0, 100).await;

        let err = create_sale(
            &db,
            &seller(),
            draft(
                "paid",
                7.0,
                vec![item("prd-1", 2.0, 1.0), item("prd-2", 5.0, 1.0)],
                vec![cash(7.0)],
            ),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Domain(CoreError::StockInsufficient {
                requested: 5,
                available: 1,
                ..
            })
        ));

        // First line's decrement rolled back with everything else.
        let untouched = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.stock_qty, 10);
        assert!(db.sales().list_for_business("biz-1", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_race_on_last_units_rejects_one() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 100).await;
        let actor = seller();

        let wants_seven = || draft("paid", 7.0, vec![item("prd-1", 7.0, 1.0)], vec![cash(7.0)]);
        let (first, second) = tokio::join!(
            create_sale(&db, &actor, wants_seven()),
            create_sale(&db, &actor, wants_seven()),
        );

        let succeeded = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, 1);

        let failed = if first.is_err() { first } else { second };
        assert!(matches!(
            failed.unwrap_err(),
            EngineError::Domain(CoreError::StockInsufficient {
                requested: 7,
                available: 3,
                ..
            })
        ));

        let product = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.stock_qty, 3);
    }

    #[tokio::test]
    async fn test_inline_client_duplicate_phone_aborts() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;
        testutil::seed_client(&db, "biz-1", "cli-1", "555-0001").await;

        let mut payload = draft("pending", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![]);
        payload.client = Some(validation::ClientDraft {
            name: Some("Sam".to_string()),
            phone: Some("555-0001".to_string()),
            email: None,
        });

        let err = create_sale(&db, &seller(), payload).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::DuplicateClient { ref field, .. }) if field == "phone"
        ));

        assert!(db.sales().list_for_business("biz-1", 10).await.unwrap().is_empty());
        assert_eq!(db.clients().list_for_business("biz-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inline_client_gets_account_and_welcome_event() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;

        let mut payload = draft("paid", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![cash(5.0)]);
        payload.client = Some(validation::ClientDraft {
            name: Some("Sam".to_string()),
            phone: Some("555-0002".to_string()),
            email: Some("sam@example.com".to_string()),
        });

        let sale = create_sale(&db, &seller(), payload).await.unwrap();
        let client_id = sale.client_id.expect("client created with sale");

        // All-cash paid sale leaves the fresh account at zero.
        let account = db.clients().get_account(&client_id).await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 0);

        let events = db.outbox().get_pending(10, 3).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, outbox_kind::CLIENT_WELCOME);
        let payload: serde_json::Value = serde_json::from_str(&events[0].payload).unwrap();
        assert_eq!(payload["client_id"], client_id.as_str());
    }

    #[tokio::test]
    async fn test_low_stock_event_queued_once_per_product() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 5, 3, 100).await;

        // Two lines on the same product; stock ends at 2, below alert 3.
        create_sale(
            &db,
            &seller(),
            draft(
                "paid",
                3.0,
                vec![item("prd-1", 2.0, 1.0), item("prd-1", 1.0, 1.0)],
                vec![cash(3.0)],
            ),
        )
        .await
        .unwrap();

        let events = db.outbox().get_pending(10, 3).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, outbox_kind::STOCK_LOW);
        let payload: serde_json::Value = serde_json::from_str(&events[0].payload).unwrap();
        assert_eq!(payload["product_id"], "prd-1");
        assert_eq!(payload["stock_qty"], 2);
        assert_eq!(payload["alert_qty"], 3);
    }

    #[tokio::test]
    async fn test_account_paid_sale_keeps_balance_owed() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;
        testutil::seed_client(&db, "biz-1", "cli-1", "555-0001").await;

        let mut payload = draft("paid", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![]);
        payload.client_id = Some("cli-1".to_string());
        payload.payments = vec![SalePaymentDraft {
            method: Some("account".to_string()),
            amount: Some(5.0),
        }];

        let sale = create_sale(&db, &seller(), payload).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Paid);

        // "Paid" on account: the money is still owed.
        let account = db.clients().get_account("cli-1").await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 500);
    }

    async fn seed_pending_sale(db: &Database) -> Sale {
        testutil::seed_business(db, "biz-1").await;
        testutil::seed_product(db, "biz-1", "prd-1", 10, 0, 500).await;
        testutil::seed_client(db, "biz-1", "cli-1", "555-0001").await;

        let mut payload = draft("pending", 5.0, vec![item("prd-1", 1.0, 5.0)], vec![]);
        payload.client_id = Some("cli-1".to_string());
        create_sale(db, &seller(), payload).await.unwrap()
    }

    #[tokio::test]
    async fn test_record_payment_progresses_status_and_ledger() {
        let db = testutil::test_db().await;
        let sale = seed_pending_sale(&db).await;

        let sale = record_payment(
            &db,
            &seller(),
            "biz-1",
            &sale.id,
            PaymentMethod::Cash,
            Money::from_cents(200),
        )
        .await
        .unwrap();
        assert_eq!(sale.status, SaleStatus::Partial);
        let account = db.clients().get_account("cli-1").await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 300);

        let sale = record_payment(
            &db,
            &seller(),
            "biz-1",
            &sale.id,
            PaymentMethod::Card,
            Money::from_cents(300),
        )
        .await
        .unwrap();
        assert_eq!(sale.status, SaleStatus::Paid);
        let account = db.clients().get_account("cli-1").await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 0);

        assert_eq!(db.sales().get_payments(&sale.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_record_payment_rejects_overpay_and_settled() {
        let db = testutil::test_db().await;
        let sale = seed_pending_sale(&db).await;

        let err = record_payment(
            &db,
            &seller(),
            "biz-1",
            &sale.id,
            PaymentMethod::Cash,
            Money::from_cents(600),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::PaymentExceedsTotal {
                total_cents: 500,
                paid_cents: 600,
            })
        ));

        record_payment(
            &db,
            &seller(),
            "biz-1",
            &sale.id,
            PaymentMethod::Cash,
            Money::from_cents(500),
        )
        .await
        .unwrap();

        let err = record_payment(
            &db,
            &seller(),
            "biz-1",
            &sale.id,
            PaymentMethod::Cash,
            Money::from_cents(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_payment_unknown_sale_is_not_found() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;

        let err = record_payment(
            &db,
            &seller(),
            "biz-1",
            "no-such-sale",
            PaymentMethod::Cash,
            Money::from_cents(100),
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::NotFound { entity: "Sale", .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_sale_restocks_and_releases_claim() {
        let db = testutil::test_db().await;
        testutil::seed_business(&db, "biz-1").await;
        testutil::seed_product(&db, "biz-1", "prd-1", 10, 0, 500).await;
        testutil::seed_client(&db, "biz-1", "cli-1", "555-0001").await;

        let mut payload = draft("pending", 20.0, vec![item("prd-1", 4.0, 5.0)], vec![]);
        payload.client_id = Some("cli-1".to_string());
        let sale = create_sale(&db, &seller(), payload).await.unwrap();

        let before = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before.stock_qty, 6);

        let cancelled = cancel_sale(&db, &seller(), "biz-1", &sale.id).await.unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());

        let after = db
            .products()
            .get_by_id("biz-1", "prd-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.stock_qty, 10);

        let account = db.clients().get_account("cli-1").await.unwrap().unwrap();
        assert_eq!(account.balance_cents, 0);

        // Cancellation is terminal.
        let err = cancel_sale(&db, &seller(), "biz-1", &sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidStateTransition { .. })
        ));
    }
}
