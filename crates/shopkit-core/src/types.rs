//! # Domain Types
//!
//! Core entity types for the Shopkit back office.
//!
//! ## Entity Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Entity Relationships                             │
//! │                                                                         │
//! │  Business (tenant root)                                                 │
//! │      │                                                                  │
//! │      ├──► Category ──┐                                                  │
//! │      ├──► Supplier ──┼──► Product ◄── SaleItem / OrderItem             │
//! │      │               │      stock_qty, alert_qty, prices               │
//! │      │                                                                  │
//! │      ├──► Client ──► ClientAccount (running balance)                    │
//! │      │       ▲                                                          │
//! │      ├──► Sale ──► SaleItem*, Payment*                                  │
//! │      ├──► Order ──► OrderItem* (cumulative received_qty)               │
//! │      ├──► StockTransfer (source product → destination business)        │
//! │      ├──► Report (periodic rollup, upserted per period)                │
//! │      └──► OutboxEvent (queued side effects)                            │
//! │                                                                         │
//! │  Every entity carries business_id; cross-tenant reads are forbidden.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Ids are UUIDv4 strings
//! - Monetary fields are `*_cents: i64`, with `Money` accessor methods
//! - Status enums serialize as snake_case strings (database and JSON)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::lifecycle::{OrderStatus, ReportStatus};
use crate::money::Money;

// =============================================================================
// Business
// =============================================================================

/// A tenant: one shop with its own products, clients, sales and reports.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Business {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name of the shop.
    pub name: String,

    /// Inactive businesses are skipped by the report fan-out.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Category / Supplier
// =============================================================================

/// A product category. Names are unique within a business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub business_id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A supplier purchase orders are placed with.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product held in stock by one business.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business this product belongs to.
    pub business_id: String,

    /// Display name.
    pub name: String,

    /// Optional stock keeping unit.
    pub sku: Option<String>,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Optional default supplier reference.
    pub supplier_id: Option<String>,

    /// Current stock level. Never negative after a committed mutation.
    pub stock_qty: i64,

    /// Quantity recorded when the product was first registered.
    pub initial_qty: i64,

    /// Low-stock alert threshold; 0 disables alerting.
    pub alert_qty: i64,

    /// What the business pays the supplier, in cents.
    pub purchase_price_cents: i64,

    /// Wholesale selling price, in cents.
    pub wholesale_price_cents: i64,

    /// Retail selling price, in cents.
    pub retail_price_cents: i64,

    /// Optional expiration date for perishables.
    #[ts(as = "Option<String>")]
    pub expires_on: Option<NaiveDate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn purchase_price(&self) -> Money {
        Money::from_cents(self.purchase_price_cents)
    }

    /// Returns the wholesale price as a Money type.
    #[inline]
    pub fn wholesale_price(&self) -> Money {
        Money::from_cents(self.wholesale_price_cents)
    }

    /// Returns the retail price as a Money type.
    #[inline]
    pub fn retail_price(&self) -> Money {
        Money::from_cents(self.retail_price_cents)
    }

    /// Checks whether current stock covers a requested quantity.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.stock_qty >= quantity
    }

    /// True when stock has fallen to or below the alert threshold.
    /// A threshold of 0 disables alerting entirely.
    pub fn is_low_stock(&self) -> bool {
        self.alert_qty > 0 && self.stock_qty <= self.alert_qty
    }
}

// =============================================================================
// Client / Account
// =============================================================================

/// A customer of one business.
///
/// Phone is unique within the business; email too, when present. An inline
/// client created during checkout gets an account opened at balance zero.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub business_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Running balance of a client's account.
///
/// Positive balance = amount the client owes the business (credit sales);
/// it moves only inside sale transactions (§ checkout engine).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ClientAccount {
    pub client_id: String,
    pub balance_cents: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ClientAccount {
    /// Returns the balance as a Money type.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The settlement status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Fully settled at submission: sum(payments) == total.
    Paid,
    /// Nothing paid yet: sum(payments) == 0, total owed on the client account.
    Pending,
    /// Partly settled: 0 < sum(payments) < total, remainder on the account.
    Partial,
    /// Terminal. Stock restocked, outstanding claim released.
    Cancelled,
}

impl SaleStatus {
    /// Statuses that leave an amount owed and therefore need a client.
    #[inline]
    pub fn requires_client(&self) -> bool {
        matches!(self, SaleStatus::Pending | SaleStatus::Partial)
    }

    /// Cancelled never reopens.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SaleStatus::Cancelled)
    }

    /// All accepted wire values, for validator error messages.
    pub fn allowed() -> Vec<String> {
        ["paid", "pending", "partial", "cancelled"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaleStatus::Paid => write!(f, "paid"),
            SaleStatus::Pending => write!(f, "pending"),
            SaleStatus::Partial => write!(f, "partial"),
            SaleStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for SaleStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(SaleStatus::Paid),
            "pending" => Ok(SaleStatus::Pending),
            "partial" => Ok(SaleStatus::Partial),
            "cancelled" => Ok(SaleStatus::Cancelled),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
    /// Charged to the client's running account instead of immediate cash.
    /// Requires a client reference on the sale.
    Account,
}

impl PaymentMethod {
    /// All accepted wire values, for validator error messages.
    pub fn allowed() -> Vec<String> {
        ["cash", "card", "transfer", "account"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Transfer => write!(f, "transfer"),
            PaymentMethod::Account => write!(f, "account"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            "account" => Ok(PaymentMethod::Account),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A customer transaction with line items and payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub business_id: String,
    pub client_id: Option<String>,
    /// Seller identity from the external auth collaborator; not a foreign key.
    pub seller_id: Option<String>,
    pub status: SaleStatus,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Returns the total as a Money type.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// True for sales carrying an unpaid remainder on the client account.
    #[inline]
    pub fn is_credit(&self) -> bool {
        matches!(self.status, SaleStatus::Pending | SaleStatus::Partial)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze the product name at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl SaleItem {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as a Money type.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A payment against one sale. Immutable after insert except `processed_at`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Returns the amount as a Money type.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Order
// =============================================================================

/// A purchase order placed with a supplier to replenish stock.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub business_id: String,
    pub supplier_id: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub ordered_on: NaiveDate,
    /// Must not precede `ordered_on` when present.
    #[ts(as = "Option<String>")]
    pub expected_on: Option<NaiveDate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the total as a Money type.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in a purchase order.
///
/// `received_qty` accumulates across partial receipts and never exceeds
/// `quantity`; the order completes when every line is fully received.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub received_qty: i64,
}

impl OrderItem {
    /// Quantity still awaiting delivery.
    #[inline]
    pub fn outstanding(&self) -> i64 {
        self.quantity - self.received_qty
    }

    /// True when the full ordered quantity has arrived.
    #[inline]
    pub fn is_fully_received(&self) -> bool {
        self.received_qty >= self.quantity
    }
}

// =============================================================================
// Stock Transfer
// =============================================================================

/// Movement of item quantity between businesses.
///
/// The source product is always decremented. A destination product is
/// incremented only when named; otherwise the transfer is record-only on
/// the destination side.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockTransfer {
    pub id: String,
    pub source_business_id: String,
    pub source_product_id: String,
    /// Order the transferred goods originally arrived through, if tracked.
    pub source_order_id: Option<String>,
    pub dest_business_id: String,
    pub dest_product_id: Option<String>,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Report
// =============================================================================

/// The period shape a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    /// Caller supplies explicit start and end dates.
    Custom,
}

impl ReportType {
    /// All accepted wire values, for validator error messages.
    pub fn allowed() -> Vec<String> {
        ["daily", "weekly", "monthly", "quarterly", "yearly", "custom"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Daily => write!(f, "daily"),
            ReportType::Weekly => write!(f, "weekly"),
            ReportType::Monthly => write!(f, "monthly"),
            ReportType::Quarterly => write!(f, "quarterly"),
            ReportType::Yearly => write!(f, "yearly"),
            ReportType::Custom => write!(f, "custom"),
        }
    }
}

impl FromStr for ReportType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ReportType::Daily),
            "weekly" => Ok(ReportType::Weekly),
            "monthly" => Ok(ReportType::Monthly),
            "quarterly" => Ok(ReportType::Quarterly),
            "yearly" => Ok(ReportType::Yearly),
            "custom" => Ok(ReportType::Custom),
            _ => Err(()),
        }
    }
}

/// A persisted snapshot of aggregated business metrics for one period.
///
/// Unique per (business, type, period_start): regenerating for the same
/// period refreshes the figures in place.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Report {
    pub id: String,
    pub business_id: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    #[ts(as = "String")]
    pub period_start: NaiveDate,
    #[ts(as = "String")]
    pub period_end: NaiveDate,
    /// Total of non-cancelled sales in the period.
    pub revenue_cents: i64,
    pub sale_count: i64,
    /// Payments recorded in the period, regardless of sale date.
    pub payments_cents: i64,
    pub order_count: i64,
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Report {
    /// Returns the revenue as a Money type.
    #[inline]
    pub fn revenue(&self) -> Money {
        Money::from_cents(self.revenue_cents)
    }
}

// =============================================================================
// Outbox Event
// =============================================================================

/// Well-known outbox event kinds.
pub mod outbox_kind {
    /// Queued when a new client is created (welcome email).
    pub const CLIENT_WELCOME: &str = "client.welcome";
    /// Queued when a committed decrement leaves a product at or below its
    /// alert threshold.
    pub const STOCK_LOW: &str = "stock.low";
}

/// A queued side-effect record, decoupling mutations from async effects.
///
/// Delivery is at-least-once: the dispatcher marks `processed`/`processed_at`
/// on success and bumps `attempts`/`last_error` on failure, leaving the event
/// for the next poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OutboxEvent {
    pub id: String,
    pub business_id: String,
    /// One of [`outbox_kind`], or a consumer-defined kind.
    pub kind: String,
    /// JSON payload for the effect handler.
    pub payload: String,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Password Reset Token
// =============================================================================

/// Reset token issued by the external auth collaborator; this system only
/// stores it and purges it after expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PasswordResetToken {
    pub id: String,
    pub email: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// True once `now` is past the expiry instant.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
