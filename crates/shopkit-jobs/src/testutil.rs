//! Shared fixtures for sweep tests.
//!
//! Everything goes through shopkit-db's public surface, so the sweeps are
//! tested against the same rows the engines actually write.

use chrono::Utc;
use uuid::Uuid;

use shopkit_core::{Business, Product, Role};
use shopkit_db::{checkout, Database, DbConfig};

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

pub(crate) async fn seed_product(db: &Database, business_id: &str, id: &str, stock_qty: i64) {
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
        alert_qty: 0,
        purchase_price_cents: 50,
        wholesale_price_cents: 75,
        retail_price_cents: 100,
        expires_on: None,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.expect("seed product");
}

/// Records a paid cash sale with an inline client, which leaves exactly one
/// `client.welcome` event in the outbox.
pub(crate) async fn enqueue_welcome_event(db: &Database) {
    if db
        .businesses()
        .get_by_id("biz-1")
        .await
        .expect("business lookup")
        .is_none()
    {
        seed_business(db, "biz-1").await;
        seed_product(db, "biz-1", "prod-1", 1_000).await;
    }

    let actor = shopkit_core::Actor::new("user-1", "biz-1", Role::Admin);
    let draft = shopkit_core::validation::SaleDraft {
        business_id: Some("biz-1".into()),
        client: Some(shopkit_core::validation::ClientDraft {
            name: Some("Walk-in Client".into()),
            phone: Some(format!("555-{}", &Uuid::new_v4().simple().to_string()[..24])),
            email: None,
        }),
        status: Some("paid".into()),
        total: Some(1.0),
        items: vec![shopkit_core::validation::SaleItemDraft {
            product_id: Some("prod-1".into()),
            quantity: Some(1.0),
            unit_price: Some(1.0),
        }],
        payments: vec![shopkit_core::validation::SalePaymentDraft {
            method: Some("cash".into()),
            amount: Some(1.0),
        }],
        ..Default::default()
    };

    checkout::create_sale(db, &actor, draft)
        .await
        .expect("welcome sale");
}
