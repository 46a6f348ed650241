//! Refresh token store
//!
//! Persists the digest of each outstanding refresh secret with its
//! owner and expiry. The raw secret is never stored. Multiple live
//! rows per account are valid (one per device).

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// One outstanding refresh token
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Refresh token store
pub struct RefreshTokenStore;

impl RefreshTokenStore {
    /// Insert a record for a freshly minted secret.
    pub async fn put(
        pool: &PgPool,
        user_id: Uuid,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Look up a non-expired record by digest. Expiry is checked at
    /// read time; rows past their expiry are invisible here whether
    /// or not housekeeping has removed them yet.
    pub async fn find_live(pool: &PgPool, token_hash: &str) -> Result<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Delete by digest, returning the affected-row count.
    ///
    /// This is the serialization point for concurrent refreshes
    /// presenting the same secret: PostgreSQL serializes the two
    /// deletes on the row, so exactly one caller observes 1 and the
    /// other 0. Callers must branch on the count, never on a prior
    /// read.
    pub async fn delete_by_digest(pool: &PgPool, token_hash: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Revoke every outstanding refresh token for an account. Used on
    /// password change; forces re-authentication on all other devices.
    pub async fn delete_all_for(pool: &PgPool, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Remove expired rows. Housekeeping only; correctness never
    /// depends on this because `find_live` checks expiry at read time.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens WHERE expires_at <= NOW()
            "#,
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
