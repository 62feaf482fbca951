//! # Outbox Dispatch Worker
//!
//! Delivers queued side effects (welcome emails, low-stock alerts) to an
//! [`EventDispatcher`] implementation.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Outbox Dispatch Flow                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    outbox_events Table                          │   │
//! │  │                                                                 │   │
//! │  │  id | kind           | payload | processed | attempts           │   │
//! │  │  ───┼────────────────┼─────────┼───────────┼─────────           │   │
//! │  │  1  │ client.welcome │ {...}   │ 0         │ 0                  │   │
//! │  │  2  │ stock.low      │ {...}   │ 0         │ 3                  │   │
//! │  └────────────────────────────┬────────────────────────────────────┘   │
//! │                               │                                         │
//! │                               ▼                                         │
//! │  1. Poll: oldest unprocessed first, attempts < max, LIMIT batch         │
//! │  2. Dispatch each event to the EventDispatcher                          │
//! │  3. Success → processed = 1, processed_at = now                         │
//! │  4. Failure → attempts += 1, last_error recorded; retried next poll     │
//! │                                                                         │
//! │  Delivery is therefore at-least-once: a crash between the effect and    │
//! │  the mark leaves the event pending, and the handler runs again.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::OutboxSettings;
use crate::error::JobResult;
use shopkit_core::OutboxEvent;
use shopkit_db::Database;

// =============================================================================
// Dispatcher Seam
// =============================================================================

/// The side-effect collaborator: whatever actually sends the email, pushes
/// the webhook, or raises the alert.
///
/// Implementations must tolerate repeat delivery of the same event
/// (at-least-once semantics).
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Attempts the effect for one event.
    ///
    /// ## Returns
    /// `Err(message)` marks the event failed; the message lands in
    /// `last_error` and the event is retried on a later poll.
    async fn dispatch(&self, event: &OutboxEvent) -> Result<(), String>;
}

/// Dispatcher that only logs events. Used by the sweep binary when no real
/// delivery collaborator is wired in; useful in development.
#[derive(Debug, Default, Clone)]
pub struct LoggingDispatcher;

#[async_trait]
impl EventDispatcher for LoggingDispatcher {
    async fn dispatch(&self, event: &OutboxEvent) -> Result<(), String> {
        info!(
            event_id = %event.id,
            kind = %event.kind,
            business_id = %event.business_id,
            "Dispatching outbox event (log only)"
        );
        Ok(())
    }
}

// =============================================================================
// One-shot Batch
// =============================================================================

/// Outcome of one dispatch batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Events delivered and marked processed.
    pub delivered: usize,
    /// Events whose handler failed; left pending with a bumped attempt count.
    pub failed: usize,
}

impl DispatchSummary {
    /// Total events the batch touched.
    pub fn total(&self) -> usize {
        self.delivered + self.failed
    }
}

/// Processes one bounded batch of pending events.
///
/// Each event is handed to the dispatcher; bookkeeping happens per event,
/// so one failure never blocks the rest of the batch.
pub async fn dispatch_batch(
    db: &Database,
    dispatcher: &dyn EventDispatcher,
    settings: &OutboxSettings,
) -> JobResult<DispatchSummary> {
    let events = db
        .outbox()
        .get_pending(settings.batch_size, settings.max_attempts)
        .await?;

    if events.is_empty() {
        debug!("No pending outbox events");
        return Ok(DispatchSummary::default());
    }

    debug!(count = events.len(), "Dispatching outbox batch");

    let mut summary = DispatchSummary::default();
    for event in &events {
        match dispatcher.dispatch(event).await {
            Ok(()) => {
                db.outbox().mark_processed(&event.id).await?;
                summary.delivered += 1;
            }
            Err(message) => {
                warn!(
                    event_id = %event.id,
                    kind = %event.kind,
                    attempts = event.attempts + 1,
                    error = %message,
                    "Outbox dispatch failed"
                );
                db.outbox().mark_failed(&event.id, &message).await?;
                summary.failed += 1;
            }
        }
    }

    info!(
        delivered = summary.delivered,
        failed = summary.failed,
        "Outbox batch done"
    );

    Ok(summary)
}

// =============================================================================
// Long-running Worker
// =============================================================================

/// Polls the outbox on an interval and dispatches batches until shut down.
///
/// ## Usage
/// ```rust,ignore
/// let (worker, handle) = OutboxWorker::new(db, Arc::new(mailer), settings);
/// tokio::spawn(worker.run());
/// // ... later
/// handle.shutdown().await;
/// ```
pub struct OutboxWorker {
    db: Database,
    dispatcher: Arc<dyn EventDispatcher>,
    settings: OutboxSettings,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping the worker.
#[derive(Clone)]
pub struct OutboxWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl OutboxWorkerHandle {
    /// Triggers graceful shutdown. A poll in flight finishes first.
    pub async fn shutdown(&self) {
        // A closed channel means the worker already stopped.
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl OutboxWorker {
    /// Creates a worker and its control handle.
    pub fn new(
        db: Database,
        dispatcher: Arc<dyn EventDispatcher>,
        settings: OutboxSettings,
    ) -> (Self, OutboxWorkerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = OutboxWorker {
            db,
            dispatcher,
            settings,
            shutdown_rx,
        };

        (worker, OutboxWorkerHandle { shutdown_tx })
    }

    /// Runs the poll loop. Spawn this as a background task.
    pub async fn run(mut self) {
        info!(
            poll_interval_secs = self.settings.poll_interval_secs,
            batch_size = self.settings.batch_size,
            "Outbox worker starting"
        );

        let mut interval = tokio::time::interval(self.settings.poll_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = dispatch_batch(&self.db, self.dispatcher.as_ref(), &self.settings).await {
                        error!(?e, "Failed to process outbox batch");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Outbox worker shutting down");
                    break;
                }
            }
        }

        info!("Outbox worker stopped");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
