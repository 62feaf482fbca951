//! # Validation Module
//!
//! Total validators that turn loosely-typed dashboard payloads into
//! normalized, constraint-checked requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard (TypeScript)                                       │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Draft structs (serde)                                        │
//! │  ├── Shape checks (types, optional fields)                             │
//! │  └── THIS MODULE: total validation → normalized request                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engines + Database (SQLite)                                  │
//! │  ├── Stock floors, payment consistency, lifecycle                      │
//! │  └── NOT NULL / UNIQUE / foreign key constraints                       │
//! │                                                                         │
//! │  Defense in depth: each layer catches different errors                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Contract
//! Each `validate_*` function consumes a draft and returns either a
//! normalized request or one of two failure classes:
//!
//! - [`ValidationError::MissingIdentifier`] when the payload cannot be
//!   attributed to a business at all (no usable `business_id`). Nothing
//!   else is validated in that case.
//! - [`ValidationError::Invalid`] carrying *every* field-level violation
//!   found. Validators never stop at the first problem.
//!
//! Existence checks (does this product belong to this business?), stock
//! floors, duplicate-client probes and payment/status consistency are not
//! validation concerns; they run inside the engines.
//!
//! ## Usage
//! ```rust
//! use shopkit_core::validation::{validate_sale, SaleDraft};
//!
//! let draft: SaleDraft = serde_json::from_value(serde_json::json!({
//!     "business_id": "biz-1",
//!     "status": "paid",
//!     "total": 4.0,
//!     "items": [{ "product_id": "prd-1", "quantity": 2.0, "unit_price": 2.0 }],
//!     "payments": [{ "method": "cash", "amount": 4.0 }],
//! }))
//! .unwrap();
//!
//! let request = validate_sale(draft).unwrap();
//! assert_eq!(request.total.cents(), 400);
//! assert_eq!(request.items[0].quantity, 2);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{FieldError, ValidationError, ValidationResult};
use crate::money::Money;
use crate::period::{derive_range, DateRange};
use crate::types::{PaymentMethod, ReportType, SaleStatus};
use crate::{MAX_LINE_ITEMS, MAX_LINE_QUANTITY};

// =============================================================================
// Draft Structs (wire shapes)
// =============================================================================

/// Raw sale payload as the dashboard submits it.
///
/// Every field is optional at this layer; [`validate_sale`] decides what is
/// actually required. Quantities and amounts arrive as JSON numbers and are
/// normalized to integer quantities and cents.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDraft {
    pub business_id: Option<String>,
    /// Reference to an existing client. Takes precedence over `client`.
    pub client_id: Option<String>,
    /// Inline profile for a client created together with the sale.
    pub client: Option<ClientDraft>,
    pub seller_id: Option<String>,
    pub status: Option<String>,
    /// Declared sale total, in major currency units.
    pub total: Option<f64>,
    #[serde(default)]
    pub items: Vec<SaleItemDraft>,
    #[serde(default)]
    pub payments: Vec<SalePaymentDraft>,
}

/// One raw line item of a sale draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemDraft {
    pub product_id: Option<String>,
    pub quantity: Option<f64>,
    /// Unit price in major currency units.
    pub unit_price: Option<f64>,
}

/// One raw payment of a sale draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalePaymentDraft {
    pub method: Option<String>,
    /// Amount in major currency units.
    pub amount: Option<f64>,
}

/// Inline client profile inside a sale draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientDraft {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Raw purchase order payload. Dates are ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub business_id: Option<String>,
    pub supplier_id: Option<String>,
    /// Declared order total, in major currency units.
    pub total: Option<f64>,
    pub ordered_on: Option<String>,
    pub expected_on: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemDraft>,
}

/// One raw line item of an order draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemDraft {
    pub product_id: Option<String>,
    pub quantity: Option<f64>,
    /// Unit purchase price in major currency units.
    pub unit_price: Option<f64>,
}

/// Raw report generation payload.
///
/// Non-custom types derive their period from `reference_date` (or, when
/// absent, from the day the engine runs). `custom` requires explicit
/// `period_start`/`period_end`; an explicit period wins over the reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportDraft {
    pub business_id: Option<String>,
    pub report_type: Option<String>,
    pub reference_date: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
}

// =============================================================================
// Normalized Requests
// =============================================================================

/// Client attribution of a sale: an existing row or a profile to create
/// inside the sale transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    Existing(String),
    New(ClientProfile),
}

/// Validated inline client profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientProfile {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Validated sale line: positive integral quantity, non-negative price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    /// Price times quantity for this line.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// Validated payment: positive amount, known method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalePayment {
    pub method: PaymentMethod,
    pub amount: Money,
}

/// Fully validated sale creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub business_id: String,
    pub client: Option<ClientRef>,
    pub seller_id: Option<String>,
    pub status: SaleStatus,
    pub total: Money,
    pub items: Vec<SaleLine>,
    pub payments: Vec<SalePayment>,
}

/// Validated order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Fully validated purchase order creation request. Orders always start in
/// the `draft` lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub business_id: String,
    pub supplier_id: String,
    pub total: Money,
    pub ordered_on: NaiveDate,
    pub expected_on: Option<NaiveDate>,
    pub items: Vec<OrderLine>,
}

/// Fully validated report generation request.
///
/// `range` is `Some` for `custom` reports and for non-custom drafts that
/// carried a reference date; `None` means the engine derives the period
/// from the current date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub business_id: String,
    pub report_type: ReportType,
    pub range: Option<DateRange>,
}

// =============================================================================
// Sale Validator
// =============================================================================

/// Validates and normalizes a sale draft.
///
/// ## Rules
/// - `business_id` present, else `MissingIdentifier`
/// - `items` non-empty, at most [`MAX_LINE_ITEMS`]; each line references a
///   product, `quantity` integral in `1..=`[`MAX_LINE_QUANTITY`],
///   `unit_price >= 0`
/// - `total >= 0`
/// - `status` one of the sale status enumeration
/// - a client reference (id or inline profile) when status is `partial`
///   or `pending`
/// - paid amount strictly positive when status is `partial`
/// - each payment has a known method and a strictly positive amount
///
/// Duplicate product references across lines are deliberately not rejected;
/// the inventory engine accumulates their decrements sequentially.
pub fn validate_sale(draft: SaleDraft) -> ValidationResult<SaleRequest> {
    let business_id = require_identifier(&draft.business_id)?;

    let mut errors = Vec::new();

    let status = match opt_str(&draft.status) {
        Some(raw) => match raw.parse::<SaleStatus>() {
            Ok(status) => Some(status),
            Err(()) => {
                errors.push(FieldError::NotAllowed {
                    field: "status".to_string(),
                    allowed: SaleStatus::allowed(),
                });
                None
            }
        },
        None => {
            errors.push(FieldError::required("status"));
            None
        }
    };

    let total = to_price(draft.total, "total", &mut errors);

    let mut items = Vec::with_capacity(draft.items.len());
    if draft.items.is_empty() {
        errors.push(FieldError::required("items"));
    } else if draft.items.len() > MAX_LINE_ITEMS {
        errors.push(FieldError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    } else {
        for (index, item) in draft.items.iter().enumerate() {
            let product_id = match opt_str(&item.product_id) {
                Some(id) => Some(id.to_string()),
                None => {
                    errors.push(FieldError::required(format!("items[{index}].product_id")));
                    None
                }
            };
            let quantity =
                to_quantity(item.quantity, &format!("items[{index}].quantity"), &mut errors);
            let unit_price =
                to_price(item.unit_price, &format!("items[{index}].unit_price"), &mut errors);

            if let (Some(product_id), Some(quantity), Some(unit_price)) =
                (product_id, quantity, unit_price)
            {
                items.push(SaleLine {
                    product_id,
                    quantity,
                    unit_price,
                });
            }
        }
    }

    let mut payments = Vec::with_capacity(draft.payments.len());
    for (index, payment) in draft.payments.iter().enumerate() {
        let method = match opt_str(&payment.method) {
            Some(raw) => match raw.parse::<PaymentMethod>() {
                Ok(method) => Some(method),
                Err(()) => {
                    errors.push(FieldError::NotAllowed {
                        field: format!("payments[{index}].method"),
                        allowed: PaymentMethod::allowed(),
                    });
                    None
                }
            },
            None => {
                errors.push(FieldError::required(format!("payments[{index}].method")));
                None
            }
        };
        let amount = to_amount(payment.amount, &format!("payments[{index}].amount"), &mut errors);

        if let (Some(method), Some(amount)) = (method, amount) {
            payments.push(SalePayment { method, amount });
        }
    }

    let client = match (opt_str(&draft.client_id), &draft.client) {
        (Some(id), _) => Some(ClientRef::Existing(id.to_string())),
        (None, Some(profile)) => {
            validate_client_profile(profile, &mut errors).map(ClientRef::New)
        }
        (None, None) => None,
    };

    if let Some(status) = status {
        if status.requires_client()
            && opt_str(&draft.client_id).is_none()
            && draft.client.is_none()
        {
            errors.push(FieldError::required("client"));
        }
        if status == SaleStatus::Partial {
            let paid: Money = payments.iter().map(|p| p.amount).sum();
            if !paid.is_positive() {
                errors.push(FieldError::MustBePositive {
                    field: "amount_paid".to_string(),
                });
            }
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError::invalid(errors));
    }

    // A None piece always pushed an error above, so the fallbacks are never read.
    Ok(SaleRequest {
        business_id,
        client,
        seller_id: opt_str(&draft.seller_id).map(str::to_string),
        status: status.unwrap_or(SaleStatus::Paid),
        total: total.unwrap_or(Money::zero()),
        items,
        payments,
    })
}

fn validate_client_profile(
    draft: &ClientDraft,
    errors: &mut Vec<FieldError>,
) -> Option<ClientProfile> {
    let name = match opt_str(&draft.name) {
        Some(name) if name.len() > 200 => {
            errors.push(FieldError::TooLong {
                field: "client.name".to_string(),
                max: 200,
            });
            None
        }
        Some(name) => Some(name.to_string()),
        None => {
            errors.push(FieldError::required("client.name"));
            None
        }
    };

    let phone = match opt_str(&draft.phone) {
        Some(phone) if phone.len() > 30 => {
            errors.push(FieldError::TooLong {
                field: "client.phone".to_string(),
                max: 30,
            });
            None
        }
        Some(phone) => Some(phone.to_string()),
        None => {
            errors.push(FieldError::required("client.phone"));
            None
        }
    };

    let email = match opt_str(&draft.email) {
        Some(email) if !email.contains('@') || email.contains(' ') => {
            errors.push(FieldError::InvalidFormat {
                field: "client.email".to_string(),
                reason: "must be a valid email address".to_string(),
            });
            None
        }
        Some(email) => Some(email.to_string()),
        None => None,
    };

    match (name, phone) {
        (Some(name), Some(phone)) => Some(ClientProfile { name, phone, email }),
        _ => None,
    }
}

// =============================================================================
// Order Validator
// =============================================================================

/// Validates and normalizes a purchase order draft.
///
/// ## Rules
/// - `business_id` present, else `MissingIdentifier`
/// - `supplier_id` present
/// - `items` non-empty, at most [`MAX_LINE_ITEMS`], same per-line rules as
///   sales
/// - `total >= 0`
/// - `ordered_on` a valid ISO date; `expected_on`, when given, must not
///   precede it
pub fn validate_order(draft: OrderDraft) -> ValidationResult<OrderRequest> {
    let business_id = require_identifier(&draft.business_id)?;

    let mut errors = Vec::new();

    let supplier_id = match opt_str(&draft.supplier_id) {
        Some(id) => Some(id.to_string()),
        None => {
            errors.push(FieldError::required("supplier_id"));
            None
        }
    };

    let total = to_price(draft.total, "total", &mut errors);

    let mut items = Vec::with_capacity(draft.items.len());
    if draft.items.is_empty() {
        errors.push(FieldError::required("items"));
    } else if draft.items.len() > MAX_LINE_ITEMS {
        errors.push(FieldError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    } else {
        for (index, item) in draft.items.iter().enumerate() {
            let product_id = match opt_str(&item.product_id) {
                Some(id) => Some(id.to_string()),
                None => {
                    errors.push(FieldError::required(format!("items[{index}].product_id")));
                    None
                }
            };
            let quantity =
                to_quantity(item.quantity, &format!("items[{index}].quantity"), &mut errors);
            let unit_price =
                to_price(item.unit_price, &format!("items[{index}].unit_price"), &mut errors);

            if let (Some(product_id), Some(quantity), Some(unit_price)) =
                (product_id, quantity, unit_price)
            {
                items.push(OrderLine {
                    product_id,
                    quantity,
                    unit_price,
                });
            }
        }
    }

    let ordered_on = match opt_str(&draft.ordered_on) {
        Some(raw) => parse_date(raw, "ordered_on", &mut errors),
        None => {
            errors.push(FieldError::required("ordered_on"));
            None
        }
    };
    let expected_on = match opt_str(&draft.expected_on) {
        Some(raw) => parse_date(raw, "expected_on", &mut errors),
        None => None,
    };

    if let (Some(ordered), Some(expected)) = (ordered_on, expected_on) {
        if expected < ordered {
            errors.push(FieldError::MustNotPrecede {
                field: "expected_on".to_string(),
                other: "ordered_on".to_string(),
            });
        }
    }

    if !errors.is_empty() {
        return Err(ValidationError::invalid(errors));
    }

    // A None piece always pushed an error above, so the fallbacks are never read.
    Ok(OrderRequest {
        business_id,
        supplier_id: supplier_id.unwrap_or_default(),
        total: total.unwrap_or(Money::zero()),
        ordered_on: ordered_on.unwrap_or(NaiveDate::MIN),
        expected_on,
        items,
    })
}

// =============================================================================
// Report Validator
// =============================================================================

/// Validates and normalizes a report generation draft.
///
/// ## Rules
/// - `business_id` present, else `MissingIdentifier`
/// - `report_type` one of the report type enumeration
/// - `custom`: both `period_start` and `period_end` valid ISO dates with
///   `period_start <= period_end`
/// - non-custom: optional `reference_date`; when present, the period is
///   derived here, otherwise the engine derives it from the current date
pub fn validate_report(draft: ReportDraft) -> ValidationResult<ReportRequest> {
    let business_id = require_identifier(&draft.business_id)?;

    let mut errors = Vec::new();

    let report_type = match opt_str(&draft.report_type) {
        Some(raw) => match raw.parse::<ReportType>() {
            Ok(report_type) => Some(report_type),
            Err(()) => {
                errors.push(FieldError::NotAllowed {
                    field: "report_type".to_string(),
                    allowed: ReportType::allowed(),
                });
                None
            }
        },
        None => {
            errors.push(FieldError::required("report_type"));
            None
        }
    };

    let range = match report_type {
        Some(ReportType::Custom) => {
            let start = match opt_str(&draft.period_start) {
                Some(raw) => parse_date(raw, "period_start", &mut errors),
                None => {
                    errors.push(FieldError::required("period_start"));
                    None
                }
            };
            let end = match opt_str(&draft.period_end) {
                Some(raw) => parse_date(raw, "period_end", &mut errors),
                None => {
                    errors.push(FieldError::required("period_end"));
                    None
                }
            };
            match (start, end) {
                (Some(start), Some(end)) if end < start => {
                    errors.push(FieldError::MustNotPrecede {
                        field: "period_end".to_string(),
                        other: "period_start".to_string(),
                    });
                    None
                }
                (Some(start), Some(end)) => Some(DateRange::new(start, end)),
                _ => None,
            }
        }
        Some(report_type) => match opt_str(&draft.reference_date) {
            Some(raw) => match parse_date(raw, "reference_date", &mut errors) {
                Some(reference) => {
                    let derived = derive_range(report_type, reference);
                    if derived.is_none() {
                        errors.push(FieldError::InvalidFormat {
                            field: "reference_date".to_string(),
                            reason: "date out of supported range".to_string(),
                        });
                    }
                    derived
                }
                None => None,
            },
            None => None,
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(ValidationError::invalid(errors));
    }

    // A None piece always pushed an error above, so the fallback is never read.
    Ok(ReportRequest {
        business_id,
        report_type: report_type.unwrap_or(ReportType::Daily),
        range,
    })
}

// =============================================================================
// Field Helpers
// =============================================================================

/// Trimmed, non-empty view of an optional string field.
fn opt_str(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// The distinguishable failure class: no usable business attribution.
fn require_identifier(raw: &Option<String>) -> Result<String, ValidationError> {
    opt_str(raw)
        .map(str::to_string)
        .ok_or(ValidationError::MissingIdentifier {
            field: "business_id",
        })
}

/// Converts a major-unit amount to cents, rejecting non-finite values and
/// sub-cent precision.
fn to_money(raw: Option<f64>, field: &str, errors: &mut Vec<FieldError>) -> Option<Money> {
    let value = match raw {
        Some(value) => value,
        None => {
            errors.push(FieldError::required(field));
            return None;
        }
    };
    if !value.is_finite() {
        errors.push(FieldError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
        return None;
    }
    let scaled = value * 100.0;
    let cents = scaled.round();
    if (scaled - cents).abs() > 1e-6 {
        errors.push(FieldError::InvalidFormat {
            field: field.to_string(),
            reason: "at most two decimal places".to_string(),
        });
        return None;
    }
    // Beyond 2^53 cents f64 can no longer represent integers exactly.
    if cents.abs() >= 9.0e15 {
        errors.push(FieldError::InvalidFormat {
            field: field.to_string(),
            reason: "amount out of range".to_string(),
        });
        return None;
    }
    Some(Money::from_cents(cents as i64))
}

/// A money field that must not be negative (prices, totals).
fn to_price(raw: Option<f64>, field: &str, errors: &mut Vec<FieldError>) -> Option<Money> {
    let money = to_money(raw, field, errors)?;
    if money.is_negative() {
        errors.push(FieldError::MustNotBeNegative {
            field: field.to_string(),
        });
        return None;
    }
    Some(money)
}

/// A money field that must be strictly positive (payment amounts).
fn to_amount(raw: Option<f64>, field: &str, errors: &mut Vec<FieldError>) -> Option<Money> {
    let money = to_money(raw, field, errors)?;
    if !money.is_positive() {
        errors.push(FieldError::MustBePositive {
            field: field.to_string(),
        });
        return None;
    }
    Some(money)
}

/// Coerces a quantity to a positive integer within the line cap.
fn to_quantity(raw: Option<f64>, field: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    let value = match raw {
        Some(value) => value,
        None => {
            errors.push(FieldError::required(field));
            return None;
        }
    };
    if !value.is_finite() || value.fract() != 0.0 {
        errors.push(FieldError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        });
        return None;
    }
    let quantity = value as i64;
    if quantity <= 0 {
        errors.push(FieldError::MustBePositive {
            field: field.to_string(),
        });
        return None;
    }
    if quantity > MAX_LINE_QUANTITY {
        errors.push(FieldError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
        return None;
    }
    Some(quantity)
}

/// Parses an ISO `YYYY-MM-DD` date.
fn parse_date(raw: &str, field: &str, errors: &mut Vec<FieldError>) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(FieldError::InvalidFormat {
                field: field.to_string(),
                reason: "expected YYYY-MM-DD".to_string(),
            });
            None
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
