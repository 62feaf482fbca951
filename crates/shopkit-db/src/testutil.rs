//! Shared fixtures for repository and engine tests.
//!
//! Every helper writes through the public repository surface or the raw pool
//! so tests exercise the same SQL paths production code uses.

use chrono::{DateTime, NaiveDate, Utc};

use crate::pool::{Database, DbConfig};
use shopkit_core::{
    Business, Client, Order, OrderStatus, Payment, PaymentMethod, Product, Sale, SaleItem,
    SaleStatus, Supplier,
};

/// Fresh in-memory database with migrations applied.
pub(crate) async fn test_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) async fn seed_business(db: &Database, id: &str) {
    let business = Business {
        id: id.to_string(),
        name: format!("Shop {id}"),
        active: true,
        created_at: Utc::now(),
    };
    db.businesses()
        .insert(&business)
        .await
        .expect("seed business");
}

pub(crate) async fn seed_supplier(db: &Database, business_id: &str, id: &str) {
    let supplier = Supplier {
        id: id.to_string(),
        business_id: business_id.to_string(),
        name: format!("Supplier {id}"),
        phone: None,
        email: None,
        created_at: Utc::now(),
    };
    db.products()
        .insert_supplier(&supplier)
        .await
        .expect("seed supplier");
}

pub(crate) async fn seed_product(
    db: &Database,
    business_id: &str,
    id: &str,
    stock_qty: i64,
    alert_qty: i64,
    retail_cents: i64,
) {
    let now = Utc::now();
    let product = Product {
        id: id.to_string(),
        business_id: business_id.to_string(),
        name: format!("Product {id}"),
        sku: None,
        category_id: None,
        supplier_id: None,
        stock_qty,
        initial_qty: stock_qty,
        alert_qty,
        purchase_price_cents: retail_cents / 2,
        wholesale_price_cents: retail_cents * 3 / 4,
        retail_price_cents: retail_cents,
        expires_on: None,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("seed product");
}

/// Builds a client row without inserting it.
pub(crate) fn client_row(business_id: &str, id: &str, phone: &str) -> Client {
    Client {
        id: id.to_string(),
        business_id: business_id.to_string(),
        name: format!("Client {id}"),
        phone: phone.to_string(),
        email: None,
        created_at: Utc::now(),
    }
}

/// Inserts a client together with its zero-balance account.
pub(crate) async fn seed_client(db: &Database, business_id: &str, id: &str, phone: &str) {
    let client = client_row(business_id, id, phone);
    db.clients().insert(&client).await.expect("seed client");
}

/// Inserts a sale plus its line items in one transaction.
///
/// `items` are `(product_id, quantity, unit_price_cents)` triples; the sale
/// total is the sum of the line totals. The referenced products must already
/// exist.
pub(crate) async fn insert_sale_rows(
    db: &Database,
    business_id: &str,
    sale_id: &str,
    status: SaleStatus,
    created_at: DateTime<Utc>,
    items: &[(&str, i64, i64)],
) {
    let total_cents: i64 = items.iter().map(|(_, qty, unit)| qty * unit).sum();
    let sale = Sale {
        id: sale_id.to_string(),
        business_id: business_id.to_string(),
        client_id: None,
        seller_id: None,
        status,
        total_cents,
        created_at,
        updated_at: created_at,
        cancelled_at: None,
    };

    let mut tx = db.pool().begin().await.expect("begin");
    crate::repository::sale::insert_sale(&mut tx, &sale)
        .await
        .expect("insert sale");
    for (index, (product_id, quantity, unit_price_cents)) in items.iter().enumerate() {
        let item = SaleItem {
            id: format!("{sale_id}-item-{index}"),
            sale_id: sale_id.to_string(),
            product_id: product_id.to_string(),
            product_name: format!("Product {product_id}"),
            quantity: *quantity,
            unit_price_cents: *unit_price_cents,
            line_total_cents: quantity * unit_price_cents,
        };
        crate::repository::sale::insert_sale_item(&mut tx, &item)
            .await
            .expect("insert sale item");
    }
    tx.commit().await.expect("commit");
}

/// Inserts a processed cash payment against an existing sale.
pub(crate) async fn insert_payment_row(
    db: &Database,
    sale_id: &str,
    amount_cents: i64,
    created_at: DateTime<Utc>,
) {
    let payment = Payment {
        id: format!("{sale_id}-pay-{amount_cents}-{}", created_at.timestamp()),
        sale_id: sale_id.to_string(),
        method: PaymentMethod::Cash,
        amount_cents,
        created_at,
        processed_at: Some(created_at),
    };

    let mut tx = db.pool().begin().await.expect("begin");
    crate::repository::sale::insert_payment(&mut tx, &payment)
        .await
        .expect("insert payment");
    tx.commit().await.expect("commit");
}

/// Inserts a purchase order header without items.
pub(crate) async fn insert_order_row(
    db: &Database,
    business_id: &str,
    order_id: &str,
    status: OrderStatus,
    total_cents: i64,
    ordered_on: NaiveDate,
) {
    let now = Utc::now();
    let order = Order {
        id: order_id.to_string(),
        business_id: business_id.to_string(),
        supplier_id: format!("{order_id}-supplier"),
        status,
        total_cents,
        ordered_on,
        expected_on: None,
        created_at: now,
        updated_at: now,
    };

    seed_supplier(db, business_id, &order.supplier_id).await;
    let mut tx = db.pool().begin().await.expect("begin");
    crate::repository::order::insert_order(&mut tx, &order)
        .await
        .expect("insert order");
    tx.commit().await.expect("commit");
}
