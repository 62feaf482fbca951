//! # Retention Purge
//!
//! Deletes rows that only exist for bookkeeping once their useful life is
//! over: processed outbox events past the retention window, and password
//! reset tokens past their expiry.
//!
//! Unprocessed outbox events are never purged, whatever their age; they are
//! the operator's signal that something is stuck.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::error::JobResult;
use shopkit_db::Database;

/// Outcome of one purge run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeSummary {
    /// Processed outbox events deleted.
    pub outbox_removed: u64,
    /// Expired password reset tokens deleted.
    pub tokens_removed: u64,
}

/// Deletes processed outbox events older than `retention_days` and every
/// reset token expired as of `now`.
///
/// `now` is a parameter so the sweep binary and tests share one code path.
pub async fn run_purge(
    db: &Database,
    retention_days: u32,
    now: DateTime<Utc>,
) -> JobResult<PurgeSummary> {
    let cutoff = now - Duration::days(retention_days as i64);

    let outbox_removed = db.outbox().purge_processed(cutoff).await?;
    let tokens_removed = db.tokens().purge_expired(now).await?;

    info!(
        outbox_removed,
        tokens_removed,
        retention_days,
        "Retention purge done"
    );

    Ok(PurgeSummary {
        outbox_removed,
        tokens_removed,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
