//! Persistence for issued access tokens.
//!
//! Only a SHA-256 fingerprint of each token is stored, so a leaked table
//! cannot be replayed.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use chrono::{DateTime, Utc};
use entities::{BranchId, CallerIdentity, Role, UserId};
use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::Result;

/// Access token table operations
pub struct TokenStore;

#[derive(Debug, FromRow)]
pub(crate) struct TokenRow {
    pub user_id: UserId,
    pub role: String,
    pub branch_id: Option<BranchId>,
    pub expires_at: DateTime<Utc>,
}

impl TokenRow {
    pub(crate) fn identity(&self) -> CallerIdentity {
        CallerIdentity::new(self.user_id, Role::from(self.role.as_str()), self.branch_id)
    }
}

impl TokenStore {
    /// Create the access token table if it doesn't exist
    pub async fn create_table(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS access_tokens (
                token_hash TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id),
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_access_tokens_expiry ON access_tokens(expires_at)")
            .execute(pool)
            .await?;

        debug!("Access token table ready");
        Ok(())
    }

    /// Generate a secure random token
    pub fn generate_token() -> String {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes);
        BASE64.encode(bytes)
    }

    /// Fingerprint of a token as stored in the table
    pub fn fingerprint(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }

    pub async fn insert(
        pool: &SqlitePool,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO access_tokens (token_hash, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(Self::fingerprint(token))
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(pool)
        .await?;

        debug!("Stored access token for user {}", user_id);
        Ok(())
    }

    /// Look up a token together with its owner's current role and branch.
    pub(crate) async fn find(pool: &SqlitePool, token: &str) -> Result<Option<TokenRow>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT u.id AS user_id, u.role, u.branch_id, t.expires_at
            FROM access_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token_hash = ?
            "#,
        )
        .bind(Self::fingerprint(token))
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Delete one token. Returns whether it existed.
    pub async fn delete(pool: &SqlitePool, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE token_hash = ?")
            .bind(Self::fingerprint(token))
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every token that expired before `now`.
    pub async fn delete_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM access_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!("Pruned {} expired access tokens", removed);
        }
        Ok(removed)
    }
}
