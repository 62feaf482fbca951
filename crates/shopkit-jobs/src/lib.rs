//! # shopkit-jobs: Scheduled Work for ShopKit
//!
//! Everything an external scheduler (cron, systemd timer) triggers on a
//! timer: report regeneration, outbox dispatch, and retention purges.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ShopKit Scheduled Work                          │
//! │                                                                         │
//! │  cron / systemd timer                                                   │
//! │       │                                                                 │
//! │       ▼  `sweep --task reports|outbox|purge|all`                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    shopkit-jobs (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐ │   │
//! │  │   │ reports      │  │ outbox       │  │ purge                │ │   │
//! │  │   │ run_due      │  │ dispatch_    │  │ run_purge            │ │   │
//! │  │   │ (per-biz     │  │ batch +      │  │ (outbox retention,   │ │   │
//! │  │   │  fan-out)    │  │ OutboxWorker │  │  expired tokens)     │ │   │
//! │  │   └──────┬───────┘  └──────┬───────┘  └──────────┬───────────┘ │   │
//! │  │          └─────────────────┴─────────────────────┘             │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 ▼                                       │
//! │                      shopkit-db (engines, repositories)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design
//! - Handlers are idempotent: re-invoking a sweep repeats upserts and
//!   at-least-once deliveries, never duplicates domain rows.
//! - Handlers hold no state between invocations; all progress lives in the
//!   database.
//! - One business's failure is counted, logged, and contained.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod outbox;
pub mod purge;
pub mod reports;

#[cfg(test)]
pub(crate) mod testutil;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{JobsConfig, OutboxSettings, PurgeSettings, ReportSettings};
pub use error::{JobError, JobResult};
pub use outbox::{
    dispatch_batch, DispatchSummary, EventDispatcher, LoggingDispatcher, OutboxWorker,
    OutboxWorkerHandle,
};
pub use purge::{run_purge, PurgeSummary};
pub use reports::{run_due, SweepSummary};
