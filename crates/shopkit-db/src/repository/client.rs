//! # Client Repository
//!
//! Database operations for clients and their running accounts.
//!
//! Every client gets a `client_accounts` row at creation, opened at zero.
//! The balance only moves inside sale transactions (checkout engine), so the
//! ledger identity holds: balance = unpaid remainders of non-cancelled sales.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopkit_core::{Client, ClientAccount};

/// Repository for client database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ClientRepository::new(pool);
///
/// let client = repo.get_by_id("biz-1", "cli-1").await?;
/// let account = repo.get_account("cli-1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client and opens their account at zero.
    ///
    /// Both rows land in one transaction; a client without an account row
    /// never becomes visible.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, name = %client.name, "Inserting client");

        let mut tx = self.pool.begin().await?;

        insert_client(&mut tx, client).await?;
        open_account(&mut tx, &client.id, client.created_at).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Gets a client by ID, scoped to one business.
    pub async fn get_by_id(&self, business_id: &str, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, business_id, name, phone, email, created_at
            FROM clients
            WHERE id = ? AND business_id = ?
            "#,
        )
        .bind(id)
        .bind(business_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Lists all clients of a business, sorted by name.
    pub async fn list_for_business(&self, business_id: &str) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, business_id, name, phone, email, created_at
            FROM clients
            WHERE business_id = ?
            ORDER BY name
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Gets a client's account (running balance).
    pub async fn get_account(&self, client_id: &str) -> DbResult<Option<ClientAccount>> {
        let account = sqlx::query_as::<_, ClientAccount>(
            r#"
            SELECT client_id, balance_cents, updated_at
            FROM client_accounts
            WHERE client_id = ?
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }
}

// =============================================================================
// Transaction-scoped helpers
// =============================================================================

/// Fetches a client scoped to a business, inside a caller-owned transaction.
pub(crate) async fn get_scoped(
    conn: &mut SqliteConnection,
    business_id: &str,
    id: &str,
) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT id, business_id, name, phone, email, created_at
        FROM clients
        WHERE id = ? AND business_id = ?
        "#,
    )
    .bind(id)
    .bind(business_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(client)
}

/// Probes for an existing client with the same phone or email in a business.
///
/// ## Returns
/// `Some((field, value))` naming the first colliding field, `None` when the
/// profile is free to use. The UNIQUE indexes backstop races.
pub(crate) async fn find_duplicate(
    conn: &mut SqliteConnection,
    business_id: &str,
    phone: &str,
    email: Option<&str>,
) -> DbResult<Option<(&'static str, String)>> {
    let phone_hits: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE business_id = ? AND phone = ?")
            .bind(business_id)
            .bind(phone)
            .fetch_one(&mut *conn)
            .await?;

    if phone_hits > 0 {
        return Ok(Some(("phone", phone.to_string())));
    }

    if let Some(email) = email {
        let email_hits: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE business_id = ? AND email = ?")
                .bind(business_id)
                .bind(email)
                .fetch_one(&mut *conn)
                .await?;

        if email_hits > 0 {
            return Ok(Some(("email", email.to_string())));
        }
    }

    Ok(None)
}

/// Inserts a client row inside a caller-owned transaction.
pub(crate) async fn insert_client(conn: &mut SqliteConnection, client: &Client) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO clients (id, business_id, name, phone, email, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&client.id)
    .bind(&client.business_id)
    .bind(&client.name)
    .bind(&client.phone)
    .bind(&client.email)
    .bind(client.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Opens a client account at zero balance.
pub(crate) async fn open_account(
    conn: &mut SqliteConnection,
    client_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO client_accounts (client_id, balance_cents, updated_at)
        VALUES (?, 0, ?)
        "#,
    )
    .bind(client_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Moves a client's balance by `delta_cents` (positive = client owes more).
///
/// Callers skip the call for a zero delta. An account row always exists for
/// a real client, so zero rows affected means the client reference is stale.
pub(crate) async fn adjust_balance(
    conn: &mut SqliteConnection,
    client_id: &str,
    delta_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(client_id = %client_id, delta_cents = %delta_cents, "Adjusting client balance");

    let result = sqlx::query(
        r#"
        UPDATE client_accounts
        SET balance_cents = balance_cents + ?, updated_at = ?
        WHERE client_id = ?
        "#,
    )
    .bind(delta_cents)
    .bind(now)
    .bind(client_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("ClientAccount", client_id));
    }

    Ok(())
}

/// Helper to generate a new client ID.
pub fn generate_client_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
