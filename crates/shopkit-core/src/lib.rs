//! # shopkit-core: Pure Business Logic for Shopkit
//!
//! This crate is the **heart** of the Shopkit back office. It contains all
//! business rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkit Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External Collaborators (not in this repo)          │   │
//! │  │    HTTP routes ──► Auth/session ──► Dashboards ──► Mailer      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ normalized payloads + Actor            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopkit-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌────────────┐ ┌───────────────────┐  │   │
//! │  │  │  types  │ │  money  │ │ validation │ │ lifecycle/        │  │   │
//! │  │  │ Product │ │  Money  │ │   drafts   │ │ settlement/period │  │   │
//! │  │  │  Sale   │ │  cents  │ │   rules    │ │   state machines  │  │   │
//! │  │  └─────────┘ └─────────┘ └────────────┘ └───────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   shopkit-db (Storage Layer)                    │   │
//! │  │        SQLite repositories, transactional engines, stats        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Business, Product, Sale, Order, Client, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`auth`] - Actor/role/permission checks
//! - [`validation`] - Draft payloads and their total validators
//! - [`settlement`] - Sale/payment consistency rules and the account ledger
//! - [`lifecycle`] - Order and report status state machines
//! - [`period`] - Report period derivation (daily/weekly/.../custom)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use shopkit_core::money::Money;
//! use shopkit_core::lifecycle::OrderStatus;
//!
//! // Create money from cents (never from floats!)
//! let unit_price = Money::from_cents(2500); // 25.00
//! let line_total = unit_price.multiply_quantity(4);
//! assert_eq!(line_total.cents(), 10_000);
//!
//! // Lifecycle transitions go through one authoritative table
//! assert!(OrderStatus::Draft.can_transition(OrderStatus::Sent));
//! assert!(!OrderStatus::Cancelled.can_transition(OrderStatus::Sent));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod auth;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod period;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopkit_core::Money` instead of
// `use shopkit_core::money::Money`

pub use auth::{Actor, Permission, Role};
pub use error::{CoreError, FieldError, ValidationError};
pub use lifecycle::{OrderStatus, ReportStatus};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale or order.
///
/// ## Business Reason
/// Prevents runaway payloads and keeps transactions a size humans review.
/// Can be made configurable per-business in future versions.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Configurable per-business in future versions.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Default number of entries returned by top-product rankings.
pub const DEFAULT_TOP_PRODUCTS: usize = 10;
