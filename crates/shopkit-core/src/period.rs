//! # Report Periods
//!
//! Derives the inclusive date range a report covers from its type and a
//! reference date.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reference = 2024-05-10 (a Friday)                                      │
//! │                                                                         │
//! │  daily      →  2024-05-10 .. 2024-05-10                                 │
//! │  weekly     →  2024-05-06 .. 2024-05-12   (Monday-start week)          │
//! │  monthly    →  2024-05-01 .. 2024-05-31                                 │
//! │  quarterly  →  2024-04-01 .. 2024-06-30   (calendar quarter)           │
//! │  yearly     →  2024-01-01 .. 2024-12-31                                 │
//! │  custom     →  caller supplies both dates explicitly                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::ReportType;

// =============================================================================
// Date Range
// =============================================================================

/// An inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// True when the date falls inside the range (inclusive both ends).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// First instant of the range, for timestamp comparisons.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// First instant after the range (exclusive upper bound).
    /// SQL filters use `created_at >= start AND created_at < end`.
    pub fn end_exclusive_instant(&self) -> DateTime<Utc> {
        let next = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end);
        next.and_time(NaiveTime::MIN).and_utc()
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// Derives the range a non-custom report type covers around a reference date.
///
/// Returns `None` for [`ReportType::Custom`]: custom reports must carry
/// explicit start/end dates (the validator enforces this).
pub fn derive_range(report_type: ReportType, reference: NaiveDate) -> Option<DateRange> {
    match report_type {
        ReportType::Daily => Some(DateRange::new(reference, reference)),

        ReportType::Weekly => {
            let back = reference.weekday().num_days_from_monday() as u64;
            let start = reference.checked_sub_days(Days::new(back))?;
            let end = start.checked_add_days(Days::new(6))?;
            Some(DateRange::new(start, end))
        }

        ReportType::Monthly => {
            let start = reference.with_day(1)?;
            let end = start
                .checked_add_months(Months::new(1))?
                .checked_sub_days(Days::new(1))?;
            Some(DateRange::new(start, end))
        }

        ReportType::Quarterly => {
            // month0()/3 picks the quarter; quarters start at months 1,4,7,10
            let quarter_start = (reference.month0() / 3) * 3 + 1;
            let start = NaiveDate::from_ymd_opt(reference.year(), quarter_start, 1)?;
            let end = start
                .checked_add_months(Months::new(3))?
                .checked_sub_days(Days::new(1))?;
            Some(DateRange::new(start, end))
        }

        ReportType::Yearly => {
            let start = NaiveDate::from_ymd_opt(reference.year(), 1, 1)?;
            let end = NaiveDate::from_ymd_opt(reference.year(), 12, 31)?;
            Some(DateRange::new(start, end))
        }

        ReportType::Custom => None,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
