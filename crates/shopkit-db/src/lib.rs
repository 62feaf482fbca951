//! # shopkit-db: Storage and Transactional Engines for ShopKit
//!
//! This crate owns every SQLite access in the back office: the connection
//! pool, embedded migrations, per-entity repositories, and the transactional
//! engines that mutate several tables atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ShopKit Data Flow                                │
//! │                                                                         │
//! │  API / sweep jobs (shopkit-jobs)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     shopkit-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌────────────────┐   ┌─────────────────┐  │   │
//! │  │   │   Database   │   │  Repositories  │   │     Engines     │  │   │
//! │  │   │   (pool.rs)  │   │ (repository/*) │   │ checkout.rs     │  │   │
//! │  │   │              │   │                │   │ receiving.rs    │  │   │
//! │  │   │ SqlitePool   │◄──│ ProductRepo    │◄──│ transfer.rs     │  │   │
//! │  │   │ Migrations   │   │ SaleRepo ...   │   │ reporting.rs    │  │   │
//! │  │   └──────────────┘   └────────────────┘   └─────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (file or in-memory)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Per-entity repositories (product, sale, client, ...)
//! - [`checkout`] - Sale recording, payments, cancellation
//! - [`receiving`] - Purchase orders and goods receipt
//! - [`transfer`] - Inter-business stock transfers
//! - [`reporting`] - Periodic report generation and lifecycle
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopkit_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/shopkit.db");
//! let db = Database::new(config).await?;
//!
//! let low = db.products().list_low_stock("biz-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod receiving;
pub mod reporting;
pub mod repository;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, EngineError, EngineResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::business::BusinessRepository;
pub use repository::client::ClientRepository;
pub use repository::order::OrderRepository;
pub use repository::outbox::OutboxRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::stats::StatsRepository;
pub use repository::token::TokenRepository;
pub use repository::transfer::TransferRepository;
