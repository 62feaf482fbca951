//! # Seed Data Generator
//!
//! Populates a database with a demo business for development.
//!
//! ## Usage
//! ```bash
//! # Default: 200 products, 25 clients into ./shopkit_dev.db
//! cargo run -p shopkit-db --bin seed
//!
//! # Custom amounts and path
//! cargo run -p shopkit-db --bin seed -- --products 500 --clients 50 --db ./data/shopkit.db
//! ```
//!
//! ## Generated Data
//! One business ("Demo Shop") with:
//! - Categories and suppliers products reference
//! - Products with varied stock, alert thresholds and price tiers
//! - Clients with unique phone numbers and zero-balance accounts

use chrono::Utc;
use std::env;
use uuid::Uuid;

use shopkit_core::{Category, Client, Product, Supplier};
use shopkit_db::repository::business::new_business;
use shopkit_db::{Database, DbConfig};

const CATEGORIES: &[&str] = &["Beverages", "Snacks", "Dairy", "Household", "Grocery"];

const SUPPLIERS: &[&str] = &[
    "Atlas Distribution",
    "Riverside Wholesale",
    "Metro Supply Co",
];

const PRODUCT_STEMS: &[&str] = &[
    "Cola", "Water", "Juice", "Chips", "Biscuits", "Chocolate", "Milk", "Yogurt", "Cheese",
    "Soap", "Detergent", "Paper Towels", "Rice", "Pasta", "Flour", "Sugar", "Tea", "Coffee",
    "Honey", "Olive Oil",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut product_count: usize = 200;
    let mut client_count: usize = 25;
    let mut db_path = String::from("./shopkit_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    product_count = args[i + 1].parse().unwrap_or(200);
                    i += 1;
                }
            }
            "--clients" | "-c" => {
                if i + 1 < args.len() {
                    client_count = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Shopkit Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: 200)");
                println!("  -c, --clients <N>   Number of clients to generate (default: 25)");
                println!("  -d, --db <PATH>     Database file path (default: ./shopkit_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Shopkit Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Products: {}", product_count);
    println!("Clients:  {}", client_count);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Reuse the first active business on re-runs, create one otherwise.
    let business = match db.businesses().list_active().await?.into_iter().next() {
        Some(existing) => existing,
        None => {
            let fresh = new_business("Demo Shop");
            db.businesses().insert(&fresh).await?;
            fresh
        }
    };
    let business_id = business.id.clone();

    if db.products().count_for_business(&business_id).await? > 0 {
        println!("⚠ Business '{}' already has products", business.name);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding business '{}' ({})", business.name, business_id);

    let now = Utc::now();
    let start = std::time::Instant::now();

    let mut category_ids = Vec::new();
    for name in CATEGORIES {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.clone(),
            name: name.to_string(),
            created_at: now,
        };
        db.products().insert_category(&category).await?;
        category_ids.push(category.id);
    }
    println!("✓ {} categories", category_ids.len());

    let mut supplier_ids = Vec::new();
    for (index, name) in SUPPLIERS.iter().enumerate() {
        let supplier = Supplier {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.clone(),
            name: name.to_string(),
            phone: Some(format!("555-9{index:03}")),
            email: None,
            created_at: now,
        };
        db.products().insert_supplier(&supplier).await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ {} suppliers", supplier_ids.len());

    for n in 0..product_count {
        let stem = PRODUCT_STEMS[n % PRODUCT_STEMS.len()];
        let variant = n / PRODUCT_STEMS.len() + 1;
        // Deterministic spread: stock 0..60, retail 150..2100 cents.
        let stock = ((n * 7) % 61) as i64;
        let retail = 150 + ((n * 97) % 1951) as i64;
        let product = Product {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.clone(),
            name: format!("{stem} #{variant}"),
            sku: Some(format!("SKU-{n:05}")),
            category_id: Some(category_ids[n % category_ids.len()].clone()),
            supplier_id: Some(supplier_ids[n % supplier_ids.len()].clone()),
            stock_qty: stock,
            initial_qty: stock,
            alert_qty: 5,
            purchase_price_cents: retail / 2,
            wholesale_price_cents: retail * 3 / 4,
            retail_price_cents: retail,
            expires_on: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("✓ {} products", product_count);

    for n in 0..client_count {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            business_id: business_id.clone(),
            name: format!("Client {:03}", n + 1),
            phone: format!("555-0{n:03}"),
            email: None,
            created_at: now,
        };
        db.clients().insert(&client).await?;
    }
    println!("✓ {} clients", client_count);

    println!();
    println!("Done in {:.2?}", start.elapsed());

    db.close().await;
    Ok(())
}
