//! # Error Types
//!
//! Domain-specific error types for shopkit-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopkit-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Payload validation failures                    │
//! │  └── FieldError       - One field-level problem (collected in lists)   │
//! │                                                                         │
//! │  shopkit-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - Domain + storage, from transactional engines   │
//! │                                                                         │
//! │  Flow: FieldError → ValidationError → CoreError → EngineError → caller │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, states, amounts)
//! 3. Errors are enum variants, never String
//! 4. Validators collect *all* field errors instead of stopping at the first

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A requested stock decrement would drive a product's stock negative.
    ///
    /// ## When This Occurs
    /// - A sale line requests more than the available quantity
    /// - A transfer-out exceeds the source product's stock
    ///
    /// Aborts the entire enclosing transaction: no line item of the same
    /// operation is applied.
    ///
    /// ## Flow
    /// ```text
    /// Sale line (qty: 10)
    ///      │
    ///      ▼
    /// Guarded decrement sees stock_qty = 6
    ///      │
    ///      ▼
    /// StockInsufficient { product_id, requested: 10, available: 6 }
    ///      │
    ///      ▼
    /// Whole transaction rolls back
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    StockInsufficient {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// Inline client creation collides with an existing phone or email
    /// in the same business. Aborts before any sale is persisted.
    #[error("Client with {field} '{value}' already exists")]
    DuplicateClient { field: String, value: String },

    /// A status change violates the entity's lifecycle.
    ///
    /// ## When This Occurs
    /// - Receiving goods against a cancelled or completed order
    /// - Recording a payment against a paid or cancelled sale
    /// - Archiving a draft report without finalizing it first
    #[error("{entity} cannot transition from {from} to {to}")]
    InvalidStateTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Referenced entity does not exist or belongs to another business.
    /// The two cases are deliberately indistinguishable to the caller.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Caller's role does not grant the requested action.
    /// Surfaced before any domain logic executes.
    #[error("Role {role} is not permitted to {action}")]
    Unauthorized { role: String, action: String },

    /// Sum of payments would exceed the sale total.
    #[error("Payments ({paid_cents} cents) exceed sale total ({total_cents} cents)")]
    PaymentExceedsTotal { total_cents: i64, paid_cents: i64 },

    /// Sum of payments is inconsistent with the declared sale status.
    ///
    /// paid requires sum == total; partial requires 0 < sum < total;
    /// pending requires sum == 0.
    #[error("Status '{status}' inconsistent with payments: total {total_cents} cents, paid {paid_cents} cents")]
    PaymentStatusMismatch {
        status: String,
        total_cents: i64,
        paid_cents: i64,
    },

    /// An account-method payment was supplied without a client reference.
    #[error("Payment method 'account' requires a client reference")]
    AccountPaymentRequiresClient,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Shorthand for an InvalidStateTransition error.
    pub fn bad_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        CoreError::InvalidStateTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Payload validation outcome, distinguishing the two failure classes the
/// validators can produce.
///
/// `MissingIdentifier` means the payload cannot even be attributed (no
/// business id, or structurally unusable); `Invalid` carries every
/// field-level violation found, so callers can surface a complete list.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required top-level identifier is missing or malformed.
    /// Distinguishable from business-rule errors: nothing was validated.
    #[error("Missing or malformed identifier: {field}")]
    MissingIdentifier { field: &'static str },

    /// One or more fields violate business rules. All violations are
    /// collected; none caused an early return.
    #[error("Validation failed: {} field error(s)", .errors.len())]
    Invalid { errors: Vec<FieldError> },
}

impl ValidationError {
    /// Wraps a non-empty list of field errors.
    pub fn invalid(errors: Vec<FieldError>) -> Self {
        ValidationError::Invalid { errors }
    }

    /// Human-readable messages, one per field error.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ValidationError::MissingIdentifier { .. } => vec![self.to_string()],
            ValidationError::Invalid { errors } => {
                errors.iter().map(|e| e.to_string()).collect()
            }
        }
    }
}

// =============================================================================
// Field Error
// =============================================================================

/// One field-level validation problem.
///
/// Validators accumulate these into a `ValidationError::Invalid` list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid date, non-integral amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A date field precedes another it must not precede.
    #[error("{field} must not precede {other}")]
    MustNotPrecede { field: String, other: String },
}

impl FieldError {
    /// Shorthand for a Required error.
    pub fn required(field: impl Into<String>) -> Self {
        FieldError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result of a total validation: a normalized payload or the failure class.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::StockInsufficient {
            product_id: "prd-123".to_string(),
            requested: 10,
            available: 6,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product prd-123: available 6, requested 10"
        );

        let err = CoreError::DuplicateClient {
            field: "phone".to_string(),
            value: "0601020304".to_string(),
        };
        assert_eq!(err.to_string(), "Client with phone '0601020304' already exists");
    }

    #[test]
    fn test_transition_error_names_both_states() {
        let err = CoreError::bad_transition("Order", "cancelled", "confirmed");
        assert_eq!(err.to_string(), "Order cannot transition from cancelled to confirmed");
    }

    #[test]
    fn test_field_error_messages() {
        let err = FieldError::required("items");
        assert_eq!(err.to_string(), "items is required");

        let err = FieldError::MustNotPrecede {
            field: "expected_on".to_string(),
            other: "ordered_on".to_string(),
        };
        assert_eq!(err.to_string(), "expected_on must not precede ordered_on");
    }

    #[test]
    fn test_validation_collects_messages() {
        let err = ValidationError::invalid(vec![
            FieldError::required("items"),
            FieldError::MustBePositive {
                field: "total".to_string(),
            },
        ]);
        assert_eq!(err.messages().len(), 2);
        assert_eq!(err.to_string(), "Validation failed: 2 field error(s)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MissingIdentifier { field: "business_id" };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
