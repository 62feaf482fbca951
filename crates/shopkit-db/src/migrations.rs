//! # Embedded Migrations
//!
//! Schema migrations live as SQL files under `migrations/sqlite/` and are
//! compiled into the binary by `sqlx::migrate!`, so a deployment is just the
//! executable. [`crate::pool::Database::new`] applies pending migrations on
//! connect unless the config opts out.
//!
//! Adding a migration: drop a `NNN_description.sql` file with the next
//! sequence number into `migrations/sqlite/`. Applied files are tracked (with
//! checksums) in `_sqlx_migrations`; never edit a file that has shipped.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every pending migration, in filename order, each in its own
/// transaction. Idempotent.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(
        embedded = MIGRATOR.migrations.len(),
        "Checking for pending migrations"
    );

    MIGRATOR.run(pool).await?;

    info!("Schema is up to date");
    Ok(())
}

/// Snapshot of where the schema stands, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Migrations embedded in this binary.
    pub embedded: usize,
    /// Migrations recorded as applied in `_sqlx_migrations`.
    pub applied: usize,
}

impl MigrationStatus {
    /// True when every embedded migration has been applied.
    pub fn is_current(&self) -> bool {
        self.applied >= self.embedded
    }
}

/// Reads the migration bookkeeping table.
///
/// A database the migrator has never touched reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<MigrationStatus> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok(MigrationStatus {
        embedded: MIGRATOR.migrations.len(),
        applied: applied as usize,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[tokio::test]
    async fn test_fresh_database_is_current_after_setup() {
        let db = testutil::test_db().await;

        let status = migration_status(db.pool()).await.unwrap();
        assert!(status.is_current());
        assert_eq!(status.applied, status.embedded);
        assert!(status.embedded >= 2);
    }

    #[tokio::test]
    async fn test_rerunning_migrations_is_a_noop() {
        let db = testutil::test_db().await;

        run_migrations(db.pool()).await.unwrap();
        let status = migration_status(db.pool()).await.unwrap();
        assert!(status.is_current());
    }
}
