//! # Report Sweep
//!
//! Regenerates periodic reports for every active business.
//!
//! ## Fan-out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Report Sweep Fan-out                             │
//! │                                                                         │
//! │  run_due(db, reference, kinds, timeout)                                 │
//! │       │                                                                 │
//! │       ▼  list active businesses                                         │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐                               │
//! │  │ biz-1    │  │ biz-2    │  │ biz-3    │   one task per business       │
//! │  │ daily    │  │ daily    │  │ daily    │   (JoinSet), each under its   │
//! │  │ monthly  │  │ monthly  │  │ monthly  │   own wall-clock budget       │
//! │  └────┬─────┘  └────┬─────┘  └────┬─────┘                               │
//! │       │             │             │                                     │
//! │       └─────────────┴─────────────┘                                     │
//! │                     ▼                                                   │
//! │       SweepSummary { succeeded, failed }                                │
//! │                                                                         │
//! │  A failing or timed-out business is counted and logged; it never        │
//! │  aborts the sweep for the others. Re-running the sweep for the same     │
//! │  reference date upserts the same report rows (idempotent).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::error::JobResult;
use shopkit_core::ReportType;
use shopkit_db::{reporting, Database};

/// Outcome of one report sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    /// Businesses whose reports all regenerated.
    pub succeeded: usize,
    /// Businesses that failed, timed out, or panicked.
    pub failed: usize,
}

impl SweepSummary {
    /// True when at least one business was attempted and none succeeded.
    pub fn is_total_failure(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }
}

/// Regenerates the given report kinds for every active business, with
/// `reference` anchoring the period (daily covers that date, monthly its
/// calendar month).
///
/// One business is one spawned task under `business_timeout`; a slow or
/// broken business is counted as failed and the rest continue.
pub async fn run_due(
    db: &Database,
    reference: NaiveDate,
    kinds: &[ReportType],
    business_timeout: Duration,
) -> JobResult<SweepSummary> {
    let businesses = db.businesses().list_active().await?;

    if businesses.is_empty() {
        debug!("No active businesses, skipping report sweep");
        return Ok(SweepSummary::default());
    }

    info!(
        businesses = businesses.len(),
        kinds = kinds.len(),
        %reference,
        "Starting report sweep"
    );

    let mut tasks = JoinSet::new();
    for business in businesses {
        let db = db.clone();
        let kinds = kinds.to_vec();
        tasks.spawn(async move {
            let outcome = tokio::time::timeout(
                business_timeout,
                generate_all(&db, &business.id, &kinds, reference),
            )
            .await;

            match outcome {
                Ok(Ok(())) => (business.id, true),
                Ok(Err(e)) => {
                    error!(business_id = %business.id, error = %e, "Report generation failed");
                    (business.id, false)
                }
                Err(_) => {
                    warn!(business_id = %business.id, "Report generation timed out");
                    (business.id, false)
                }
            }
        });
    }

    let mut summary = SweepSummary::default();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((business_id, true)) => {
                debug!(%business_id, "Reports regenerated");
                summary.succeeded += 1;
            }
            Ok((_, false)) => summary.failed += 1,
            Err(e) => {
                error!(error = %e, "Report task panicked");
                summary.failed += 1;
            }
        }
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Report sweep done"
    );

    Ok(summary)
}

async fn generate_all(
    db: &Database,
    business_id: &str,
    kinds: &[ReportType],
    reference: NaiveDate,
) -> Result<(), shopkit_db::EngineError> {
    for kind in kinds {
        reporting::generate_for_business(db, business_id, *kind, reference).await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
