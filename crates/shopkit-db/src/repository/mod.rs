//! # Repository Module
//!
//! Database repository implementations for Shopkit.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.   │
//! │                                                                         │
//! │  Caller (engine, job, API layer)                                        │
//! │       │                                                                 │
//! │       │  db.products().list_low_stock("biz-1")                          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── get_by_id(&self, business_id, id)                                  │
//! │  ├── list_for_business(&self, business_id)                              │
//! │  ├── insert(&self, product)                                             │
//! │  └── list_low_stock(&self, business_id)                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • SQL is isolated in one place                                         │
//! │  • Every tenant-owned query filters on business_id                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two Calling Modes
//!
//! Each repository offers pool-backed methods for standalone reads and simple
//! writes. Mutations that must land inside an engine transaction live as
//! `pub(crate)` free functions taking `&mut SqliteConnection`, so the engines
//! can compose them with `&mut *tx` and commit or roll back as one unit.
//!
//! ## Available Repositories
//!
//! - [`business::BusinessRepository`] - Tenant roots and the active list
//! - [`product::ProductRepository`] - Product catalog and stock reads
//! - [`client::ClientRepository`] - Clients and their running accounts
//! - [`sale::SaleRepository`] - Sales, line items and payments
//! - [`order::OrderRepository`] - Purchase orders and receipts
//! - [`transfer::TransferRepository`] - Inter-business transfer records
//! - [`report::ReportRepository`] - Generated report rows
//! - [`outbox::OutboxRepository`] - Side-effect event queue
//! - [`token::TokenRepository`] - Password reset token storage
//! - [`stats::StatsRepository`] - Read-only aggregations

pub mod business;
pub mod client;
pub mod order;
pub mod outbox;
pub mod product;
pub mod report;
pub mod sale;
pub mod stats;
pub mod token;
pub mod transfer;
