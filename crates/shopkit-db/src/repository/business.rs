//! # Business Repository
//!
//! Database operations for businesses (the tenant roots). Every other
//! tenant-owned table hangs off a `business_id` from here.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopkit_core::Business;

/// Repository for business database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = BusinessRepository::new(pool);
///
/// let active = repo.list_active().await?;
/// ```
#[derive(Debug, Clone)]
pub struct BusinessRepository {
    pool: SqlitePool,
}

impl BusinessRepository {
    /// Creates a new BusinessRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BusinessRepository { pool }
    }

    /// Inserts a new business.
    pub async fn insert(&self, business: &Business) -> DbResult<()> {
        debug!(id = %business.id, name = %business.name, "Inserting business");

        sqlx::query(
            r#"
            INSERT INTO businesses (id, name, active, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&business.id)
        .bind(&business.name)
        .bind(business.active)
        .bind(business.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a business by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Business))` - Business found
    /// * `Ok(None)` - Business not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            SELECT id, name, active, created_at
            FROM businesses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(business)
    }

    /// Lists active businesses.
    ///
    /// ## Usage
    /// The report sweep fans out over this list; deactivated businesses are
    /// skipped without deleting their history.
    pub async fn list_active(&self) -> DbResult<Vec<Business>> {
        let businesses = sqlx::query_as::<_, Business>(
            r#"
            SELECT id, name, active, created_at
            FROM businesses
            WHERE active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(businesses)
    }

    /// Activates or deactivates a business.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Business doesn't exist
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        debug!(id = %id, active = %active, "Setting business active flag");

        let result = sqlx::query("UPDATE businesses SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Business", id));
        }

        Ok(())
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Checks that a business row exists, inside a caller-owned transaction.
pub(crate) async fn exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM businesses WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}

/// Helper to generate a new business ID.
pub fn generate_business_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a business row with a fresh ID, active by default.
pub fn new_business(name: impl Into<String>) -> Business {
    Business {
        id: generate_business_id(),
        name: name.into(),
        active: true,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
