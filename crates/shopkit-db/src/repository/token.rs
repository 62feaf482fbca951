//! # Password Reset Token Repository
//!
//! Storage for reset tokens issued by the external auth collaborator.
//! This system never validates passwords; it only stores tokens, answers
//! whether one is still live, and purges them after expiry.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shopkit_core::PasswordResetToken;

/// Repository for password reset token operations.
#[derive(Debug, Clone)]
pub struct TokenRepository {
    pool: SqlitePool,
}

impl TokenRepository {
    /// Creates a new TokenRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TokenRepository { pool }
    }

    /// Stores a freshly issued token.
    pub async fn issue(
        &self,
        email: &str,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> DbResult<PasswordResetToken> {
        debug!(email = %email, "Storing password reset token");

        let row = PasswordResetToken {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (id, email, token, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.email)
        .bind(&row.token)
        .bind(row.expires_at)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(row)
    }

    /// Looks up a token that has not expired yet.
    pub async fn find_valid(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, email, token, expires_at, created_at
            FROM password_reset_tokens
            WHERE token = ? AND expires_at > ?
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Deletes tokens whose expiry has passed.
    ///
    /// ## Returns
    /// Number of deleted tokens.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use chrono::Duration;

    #[tokio::test]
    async fn test_live_token_found_expired_token_not() {
        let db = testutil::test_db().await;
        let repo = db.tokens();
        let now = Utc::now();

        repo.issue("amina@example.com", "tok-live", now + Duration::hours(1))
            .await
            .unwrap();
        repo.issue("amina@example.com", "tok-dead", now - Duration::hours(1))
            .await
            .unwrap();

        assert!(repo.find_valid("tok-live", now).await.unwrap().is_some());
        assert!(repo.find_valid("tok-dead", now).await.unwrap().is_none());
        assert!(repo.find_valid("tok-missing", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_tokens() {
        let db = testutil::test_db().await;
        let repo = db.tokens();
        let now = Utc::now();

        repo.issue("a@example.com", "tok-1", now - Duration::minutes(5))
            .await
            .unwrap();
        repo.issue("b@example.com", "tok-2", now + Duration::minutes(5))
            .await
            .unwrap();

        let removed = repo.purge_expired(now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(repo.find_valid("tok-2", now).await.unwrap().is_some());
    }
}
