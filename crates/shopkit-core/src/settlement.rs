//! # Settlement Rules
//!
//! Pure rules tying a sale's declared status to its total and the sum of
//! its payments, plus the ledger arithmetic for client accounts.
//!
//! ## Status / Payment Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status      constraint on sum(payments)        client                  │
//! │  ─────────   ──────────────────────────────     ──────────────         │
//! │  paid        sum == total                       optional                │
//! │  partial     0 < sum < total                    mandatory               │
//! │  pending     sum == 0                           mandatory               │
//! │  cancelled   unconstrained (terminal)           unchanged               │
//! │                                                                         │
//! │  Cross-cutting: sum never exceeds total; an `account`-method payment   │
//! │  requires a client reference.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ledger Identity
//! A positive account balance is the amount the client owes the business.
//! Creating a sale with a client applies one delta to that balance:
//!
//! ```text
//!   delta = total − sum(payments) + sum(account-method payments)
//! ```
//!
//! Every payment reduces what is owed; `account`-method payments put their
//! amount straight back because nothing was actually received. The same
//! expression is the sale's outstanding claim, so cancellation subtracts it
//! (recomputed over the payments recorded by then) to release the debt.
//!
//! Client presence for `partial`/`pending` is a validation concern
//! (`validation::validate_sale`); this module assumes it and only enforces
//! the `account`-method rule.

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, SaleStatus};
use crate::validation::SalePayment;

// =============================================================================
// Sums
// =============================================================================

/// Sum of all payment amounts.
pub fn paid_total(payments: &[SalePayment]) -> Money {
    payments.iter().map(|p| p.amount).sum()
}

/// Sum of `account`-method payment amounts only.
pub fn account_portion(payments: &[SalePayment]) -> Money {
    payments
        .iter()
        .filter(|p| p.method == PaymentMethod::Account)
        .map(|p| p.amount)
        .sum()
}

// =============================================================================
// Consistency Check
// =============================================================================

/// Enforces the joint invariant between status, total and payments.
///
/// Checked at submission time, before anything is persisted. Violations
/// surface as [`CoreError::AccountPaymentRequiresClient`],
/// [`CoreError::PaymentExceedsTotal`] or
/// [`CoreError::PaymentStatusMismatch`], in that precedence.
pub fn check_consistency(
    status: SaleStatus,
    total: Money,
    payments: &[SalePayment],
    has_client: bool,
) -> CoreResult<()> {
    if !has_client
        && payments
            .iter()
            .any(|p| p.method == PaymentMethod::Account)
    {
        return Err(CoreError::AccountPaymentRequiresClient);
    }

    let paid = paid_total(payments);
    if paid > total {
        return Err(CoreError::PaymentExceedsTotal {
            total_cents: total.cents(),
            paid_cents: paid.cents(),
        });
    }

    let consistent = match status {
        SaleStatus::Paid => paid == total,
        SaleStatus::Partial => paid.is_positive() && paid < total,
        SaleStatus::Pending => paid.is_zero(),
        // Terminal; no payment constraint.
        SaleStatus::Cancelled => true,
    };

    if consistent {
        Ok(())
    } else {
        Err(CoreError::PaymentStatusMismatch {
            status: status.to_string(),
            total_cents: total.cents(),
            paid_cents: paid.cents(),
        })
    }
}

// =============================================================================
// Ledger Arithmetic
// =============================================================================

/// The sale's unpaid claim against the client:
/// `total − sum(payments) + sum(account payments)`.
///
/// Added to the client balance when a sale is created, subtracted
/// (recomputed over the payments recorded by then) when it is cancelled.
pub fn outstanding_claim(total: Money, payments: &[SalePayment]) -> Money {
    total - paid_total(payments) + account_portion(payments)
}

/// Balance effect of one later payment against a credit sale.
///
/// Cash-like methods reduce the debt; an `account`-method payment moves
/// the remainder onto the account without changing the balance.
pub fn payment_ledger_delta(method: PaymentMethod, amount: Money) -> Money {
    match method {
        PaymentMethod::Account => Money::zero(),
        _ => Money::zero() - amount,
    }
}

// =============================================================================
// Later Settlement
// =============================================================================

/// Status a sale holds once `paid` covers it.
pub fn recompute_status(total: Money, paid: Money) -> SaleStatus {
    if paid >= total {
        SaleStatus::Paid
    } else if paid.is_positive() {
        SaleStatus::Partial
    } else {
        SaleStatus::Pending
    }
}

/// Checks one additional payment against a sale and returns the status the
/// sale moves to.
///
/// Only `pending` and `partial` sales accept further payments; anything
/// else is an [`CoreError::InvalidStateTransition`]. A payment pushing the
/// sum over the total is a [`CoreError::PaymentExceedsTotal`].
pub fn accept_payment(
    status: SaleStatus,
    total: Money,
    already_paid: Money,
    amount: Money,
) -> CoreResult<SaleStatus> {
    let paid = already_paid + amount;
    let target = recompute_status(total, paid);

    if !matches!(status, SaleStatus::Pending | SaleStatus::Partial) {
        return Err(CoreError::bad_transition("Sale", status, target));
    }
    if paid > total {
        return Err(CoreError::PaymentExceedsTotal {
            total_cents: total.cents(),
            paid_cents: paid.cents(),
        });
    }
    Ok(target)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cash(cents: i64) -> SalePayment {
        SalePayment {
            method: PaymentMethod::Cash,
            amount: Money::from_cents(cents),
        }
    }

    fn account(cents: i64) -> SalePayment {
        SalePayment {
            method: PaymentMethod::Account,
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_paid_requires_exact_sum() {
        let total = Money::from_cents(400);
        assert!(check_consistency(SaleStatus::Paid, total, &[cash(400)], false).is_ok());
        assert!(check_consistency(SaleStatus::Paid, total, &[cash(100), cash(300)], false).is_ok());

        let err =
            check_consistency(SaleStatus::Paid, total, &[cash(300)], false).unwrap_err();
        assert!(matches!(err, CoreError::PaymentStatusMismatch { .. }));
    }

    #[test]
    fn test_sum_never_exceeds_total() {
        let total = Money::from_cents(400);
        let err =
            check_consistency(SaleStatus::Paid, total, &[cash(500)], false).unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsTotal {
                total_cents: 400,
                paid_cents: 500,
            }
        ));
    }

    #[test]
    fn test_partial_needs_strictly_between() {
        let total = Money::from_cents(500);
        assert!(check_consistency(SaleStatus::Partial, total, &[cash(200)], true).is_ok());

        let err =
            check_consistency(SaleStatus::Partial, total, &[], true).unwrap_err();
        assert!(matches!(err, CoreError::PaymentStatusMismatch { .. }));

        // Full payment cannot be declared partial
        let err =
            check_consistency(SaleStatus::Partial, total, &[cash(500)], true).unwrap_err();
        assert!(matches!(err, CoreError::PaymentStatusMismatch { .. }));
    }

    #[test]
    fn test_pending_means_nothing_paid() {
        let total = Money::from_cents(500);
        assert!(check_consistency(SaleStatus::Pending, total, &[], true).is_ok());

        let err =
            check_consistency(SaleStatus::Pending, total, &[cash(100)], true).unwrap_err();
        assert!(matches!(err, CoreError::PaymentStatusMismatch { .. }));
    }

    #[test]
    fn test_cancelled_is_unconstrained() {
        let total = Money::from_cents(500);
        assert!(check_consistency(SaleStatus::Cancelled, total, &[], false).is_ok());
        assert!(check_consistency(SaleStatus::Cancelled, total, &[cash(200)], false).is_ok());
    }

    #[test]
    fn test_account_method_needs_client() {
        let total = Money::from_cents(400);
        let err = check_consistency(SaleStatus::Paid, total, &[account(400)], false)
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountPaymentRequiresClient));

        assert!(check_consistency(SaleStatus::Paid, total, &[account(400)], true).is_ok());
    }

    #[test]
    fn test_outstanding_claim_identity() {
        let total = Money::from_cents(500);

        // All-cash paid sale leaves nothing on the account
        assert_eq!(outstanding_claim(total, &[cash(500)]), Money::zero());

        // Pending puts the full total on the account
        assert_eq!(outstanding_claim(total, &[]), total);

        // Partial puts the remainder on the account
        assert_eq!(
            outstanding_claim(total, &[cash(200)]),
            Money::from_cents(300)
        );

        // Account-paid sale owes the full total despite being "paid"
        assert_eq!(outstanding_claim(total, &[account(500)]), total);

        // Mixed: cash part settled, account part owed
        assert_eq!(
            outstanding_claim(total, &[cash(300), account(200)]),
            Money::from_cents(200)
        );
    }

    #[test]
    fn test_payment_ledger_delta() {
        let amount = Money::from_cents(150);
        assert_eq!(
            payment_ledger_delta(PaymentMethod::Cash, amount),
            Money::from_cents(-150)
        );
        assert_eq!(
            payment_ledger_delta(PaymentMethod::Card, amount),
            Money::from_cents(-150)
        );
        assert_eq!(
            payment_ledger_delta(PaymentMethod::Account, amount),
            Money::zero()
        );
    }

    #[test]
    fn test_recompute_status() {
        let total = Money::from_cents(500);
        assert_eq!(recompute_status(total, Money::zero()), SaleStatus::Pending);
        assert_eq!(
            recompute_status(total, Money::from_cents(200)),
            SaleStatus::Partial
        );
        assert_eq!(recompute_status(total, total), SaleStatus::Paid);
    }

    #[test]
    fn test_accept_payment_progression() {
        let total = Money::from_cents(500);

        let next = accept_payment(
            SaleStatus::Pending,
            total,
            Money::zero(),
            Money::from_cents(200),
        )
        .unwrap();
        assert_eq!(next, SaleStatus::Partial);

        let next = accept_payment(
            SaleStatus::Partial,
            total,
            Money::from_cents(200),
            Money::from_cents(300),
        )
        .unwrap();
        assert_eq!(next, SaleStatus::Paid);
    }

    #[test]
    fn test_accept_payment_rejects_overpayment() {
        let total = Money::from_cents(500);
        let err = accept_payment(
            SaleStatus::Partial,
            total,
            Money::from_cents(400),
            Money::from_cents(200),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::PaymentExceedsTotal {
                total_cents: 500,
                paid_cents: 600,
            }
        ));
    }

    #[test]
    fn test_accept_payment_rejects_settled_and_cancelled() {
        let total = Money::from_cents(500);
        let err = accept_payment(SaleStatus::Paid, total, total, Money::from_cents(50))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));

        let err = accept_payment(
            SaleStatus::Cancelled,
            total,
            Money::zero(),
            Money::from_cents(50),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidStateTransition { .. }));
    }
}
