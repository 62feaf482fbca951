//! # Outbox Repository
//!
//! Manages the side-effect event queue.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Outbox Pattern Implementation                        │
//! │                                                                         │
//! │  LOCAL OPERATION (e.g., checkout with a new client)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   SINGLE TRANSACTION                            │    │
//! │  │                                                                 │    │
//! │  │  1. INSERT INTO clients / sales / payments ...                  │    │
//! │  │                                                                 │    │
//! │  │  2. INSERT INTO outbox_events (kind, payload)                   │    │
//! │  │     VALUES ('client.welcome', <client JSON>)                    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← Both succeed or both fail (atomicity guaranteed)              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │            BACKGROUND WORKER (shopkit-jobs)                     │    │
//! │  │                                                                 │    │
//! │  │  1. SELECT * FROM outbox_events WHERE processed = 0             │    │
//! │  │                                                                 │    │
//! │  │  2. For each event:                                             │    │
//! │  │     a. Hand to the dispatcher (mail, webhook, ...)              │    │
//! │  │     b. On success: UPDATE ... SET processed = 1                 │    │
//! │  │     c. On failure: UPDATE ... SET attempts = attempts + 1,      │    │
//! │  │                    last_error = ?                               │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  KEY GUARANTEES:                                                        │
//! │  • An event exists iff its transaction committed                        │
//! │  • Delivery is at-least-once; consumers must tolerate replays           │
//! │  • Worker down? No problem - events queue up                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopkit_core::OutboxEvent;

/// Repository for outbox event operations.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: SqlitePool,
}

impl OutboxRepository {
    /// Creates a new OutboxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OutboxRepository { pool }
    }

    /// Gets pending events that still need dispatching.
    ///
    /// ## Arguments
    /// * `limit` - Maximum events to return
    /// * `max_attempts` - Skip events that already failed this many times
    ///
    /// ## Returns
    /// Unprocessed events, oldest first.
    pub async fn get_pending(&self, limit: u32, max_attempts: i64) -> DbResult<Vec<OutboxEvent>> {
        let events = sqlx::query_as::<_, OutboxEvent>(
            r#"
            SELECT id, business_id, kind, payload, processed, processed_at,
                   attempts, last_error, created_at
            FROM outbox_events
            WHERE processed = 0 AND attempts < ?
            ORDER BY created_at ASC
            LIMIT ?
            "#,
        )
        .bind(max_attempts)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    /// Marks an event as successfully dispatched.
    pub async fn mark_processed(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE outbox_events SET
                processed = 1,
                processed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a dispatch failure.
    ///
    /// ## Arguments
    /// * `id` - The event ID
    /// * `error` - Error message describing the failure
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE outbox_events SET
                attempts = attempts + 1,
                last_error = ?
            WHERE id = ?
            "#,
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts events that are still unprocessed.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM outbox_events WHERE processed = 0")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes processed events older than the cutoff (cleanup).
    ///
    /// ## Returns
    /// Number of deleted events.
    pub async fn purge_processed(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM outbox_events
            WHERE processed = 1
            AND processed_at IS NOT NULL
            AND processed_at < ?
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Queues an event inside a caller-owned transaction.
///
/// The event becomes visible to the worker only when the surrounding
/// transaction commits.
///
/// ## Example
/// ```rust,ignore
/// let payload = serde_json::json!({ "client_id": client.id });
/// outbox::enqueue(&mut tx, &business_id, outbox_kind::CLIENT_WELCOME, &payload).await?;
/// ```
pub(crate) async fn enqueue(
    conn: &mut SqliteConnection,
    business_id: &str,
    kind: &str,
    payload: &serde_json::Value,
) -> DbResult<OutboxEvent> {
    let now = Utc::now();

    debug!(business_id = %business_id, kind = %kind, "Queuing outbox event");

    let event = OutboxEvent {
        id: Uuid::new_v4().to_string(),
        business_id: business_id.to_string(),
        kind: kind.to_string(),
        payload: payload.to_string(),
        processed: false,
        processed_at: None,
        attempts: 0,
        last_error: None,
        created_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO outbox_events (id, business_id, kind, payload, processed,
                                   processed_at, attempts, last_error, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&event.id)
    .bind(&event.business_id)
    .bind(&event.kind)
    .bind(&event.payload)
    .bind(event.processed)
    .bind(event.processed_at)
    .bind(event.attempts)
    .bind(&event.last_error)
    .bind(event.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(event)
}

// =============================================================================
// Unit Tests
// =============================================================================
