//! # Lifecycle State Machines
//!
//! Authoritative status transition tables for orders and reports.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Purchase Order Lifecycle                           │
//! │                                                                         │
//! │   draft ──► sent ──► confirmed ──┬──► partially_received ──┐           │
//! │     │         │          │       │        │    ▲           │           │
//! │     │         │          │       │        └────┘ (receipt) │           │
//! │     │         │          │       └──► completed ◄──────────┘           │
//! │     │         │          │                 (terminal)                   │
//! │     ▼         ▼          ▼                                              │
//! │   cancelled ◄────── any non-terminal state                             │
//! │     (terminal)                                                          │
//! │                                                                         │
//! │   Receipts are only legal from confirmed / partially_received.         │
//! │   Cancellation never rolls back stock already received.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every status change in the storage layer goes through [`OrderStatus::transition`]
//! (or [`ReportStatus::transition`]); there is no second code path that
//! writes a status column directly from caller input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Being drafted; not yet communicated to the supplier.
    Draft,
    /// Sent to the supplier, awaiting confirmation.
    Sent,
    /// Confirmed by the supplier; goods may now be received.
    Confirmed,
    /// Some, but not all, ordered quantities have arrived.
    PartiallyReceived,
    /// Every ordered quantity has been received. Terminal.
    Completed,
    /// Abandoned before completion. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Terminal states accept no further transitions of any kind.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// States from which goods receipt is legal.
    #[inline]
    pub fn can_receive(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::PartiallyReceived)
    }

    /// The transition table. `partially_received → partially_received` is a
    /// real entry: each partial receipt re-enters the same state.
    pub fn can_transition(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Draft, Sent)
                | (Sent, Confirmed)
                | (Confirmed, PartiallyReceived)
                | (Confirmed, Completed)
                | (PartiallyReceived, PartiallyReceived)
                | (PartiallyReceived, Completed)
                | (Draft, Cancelled)
                | (Sent, Cancelled)
                | (Confirmed, Cancelled)
                | (PartiallyReceived, Cancelled)
        )
    }

    /// The single authoritative transition function.
    ///
    /// Returns the new status, or `InvalidStateTransition` naming both the
    /// current and the attempted state.
    pub fn transition(self, to: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(CoreError::bad_transition("Order", self, to))
        }
    }

    /// Status a receipt lands in, given whether every line is now full.
    #[inline]
    pub fn after_receipt(all_received: bool) -> OrderStatus {
        if all_received {
            OrderStatus::Completed
        } else {
            OrderStatus::PartiallyReceived
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Draft
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Draft => write!(f, "draft"),
            OrderStatus::Sent => write!(f, "sent"),
            OrderStatus::Confirmed => write!(f, "confirmed"),
            OrderStatus::PartiallyReceived => write!(f, "partially_received"),
            OrderStatus::Completed => write!(f, "completed"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderStatus::Draft),
            "sent" => Ok(OrderStatus::Sent),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "partially_received" => Ok(OrderStatus::PartiallyReceived),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Report Status
// =============================================================================

/// The lifecycle status of a generated report: draft → finalized → archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Freshly generated; figures refresh on regeneration.
    Draft,
    /// Signed off; figures still refresh, status is kept.
    Finalized,
    /// Retired from dashboards. Terminal.
    Archived,
}

impl ReportStatus {
    pub fn can_transition(&self, to: ReportStatus) -> bool {
        use ReportStatus::*;
        matches!((self, to), (Draft, Finalized) | (Finalized, Archived))
    }

    /// The single authoritative transition function for reports.
    pub fn transition(self, to: ReportStatus) -> CoreResult<ReportStatus> {
        if self.can_transition(to) {
            Ok(to)
        } else {
            Err(CoreError::bad_transition("Report", self, to))
        }
    }
}

impl Default for ReportStatus {
    fn default() -> Self {
        ReportStatus::Draft
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportStatus::Draft => write!(f, "draft"),
            ReportStatus::Finalized => write!(f, "finalized"),
            ReportStatus::Archived => write!(f, "archived"),
        }
    }
}

impl FromStr for ReportStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ReportStatus::Draft),
            "finalized" => Ok(ReportStatus::Finalized),
            "archived" => Ok(ReportStatus::Archived),
            _ => Err(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let s = OrderStatus::Draft;
        let s = s.transition(OrderStatus::Sent).unwrap();
        let s = s.transition(OrderStatus::Confirmed).unwrap();
        let s = s.transition(OrderStatus::PartiallyReceived).unwrap();
        let s = s.transition(OrderStatus::PartiallyReceived).unwrap();
        let s = s.transition(OrderStatus::Completed).unwrap();
        assert!(s.is_terminal());
    }

    #[test]
    fn test_full_receipt_skips_partial() {
        // All quantities arriving at once goes confirmed → completed directly
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Completed));
    }

    #[test]
    fn test_cancel_from_every_non_terminal_state() {
        for s in [
            OrderStatus::Draft,
            OrderStatus::Sent,
            OrderStatus::Confirmed,
            OrderStatus::PartiallyReceived,
        ] {
            assert!(s.can_transition(OrderStatus::Cancelled), "{s} should cancel");
        }
    }

    #[test]
    fn test_terminal_states_are_dead_ends() {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for target in [
                OrderStatus::Draft,
                OrderStatus::Sent,
                OrderStatus::Confirmed,
                OrderStatus::PartiallyReceived,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ] {
                assert!(
                    !terminal.can_transition(target),
                    "{terminal} must not reach {target}"
                );
            }
        }
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!OrderStatus::Draft.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Draft.can_transition(OrderStatus::Completed));
        assert!(!OrderStatus::Sent.can_transition(OrderStatus::PartiallyReceived));
    }

    #[test]
    fn test_receipt_legality() {
        assert!(!OrderStatus::Draft.can_receive());
        assert!(!OrderStatus::Sent.can_receive());
        assert!(OrderStatus::Confirmed.can_receive());
        assert!(OrderStatus::PartiallyReceived.can_receive());
        assert!(!OrderStatus::Completed.can_receive());
        assert!(!OrderStatus::Cancelled.can_receive());
    }

    #[test]
    fn test_transition_error_carries_states() {
        let err = OrderStatus::Cancelled
            .transition(OrderStatus::Confirmed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Order cannot transition from cancelled to confirmed"
        );
    }

    #[test]
    fn test_after_receipt() {
        assert_eq!(OrderStatus::after_receipt(true), OrderStatus::Completed);
        assert_eq!(
            OrderStatus::after_receipt(false),
            OrderStatus::PartiallyReceived
        );
    }

    #[test]
    fn test_order_status_round_trip() {
        for s in [
            "draft",
            "sent",
            "confirmed",
            "partially_received",
            "completed",
            "cancelled",
        ] {
            let parsed: OrderStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn test_report_progression() {
        let s = ReportStatus::Draft;
        let s = s.transition(ReportStatus::Finalized).unwrap();
        let s = s.transition(ReportStatus::Archived).unwrap();
        assert_eq!(s, ReportStatus::Archived);

        assert!(ReportStatus::Draft
            .transition(ReportStatus::Archived)
            .is_err());
        assert!(ReportStatus::Archived
            .transition(ReportStatus::Draft)
            .is_err());
    }
}
