//! Bearer token authentication.
//!
//! Login exchanges a username and password for an opaque bearer token.
//! Every later request presents that token and gets back the caller's
//! identity as currently recorded in the `users` table.

pub mod store;
pub mod types;

use chrono::{DateTime, Duration, Utc};
use database::Database;
use entities::CallerIdentity;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use store::TokenStore;
pub use types::{AuthConfig, Credentials, IssuedToken};

use crate::{
    error::{Result, UserError},
    password::{hash_password, verify_password},
};

/// Issues and verifies bearer tokens
#[derive(Debug, Clone)]
pub struct Authenticator {
    db: Arc<Database>,
    config: AuthConfig,
    // Checked against when the username is unknown so both failures cost one Argon2 run
    dummy_hash: String,
}

impl Authenticator {
    /// Create an authenticator, making sure the token table exists.
    pub async fn new(db: Arc<Database>, config: AuthConfig) -> Result<Self> {
        if config.token_ttl_minutes <= 0 {
            return Err(UserError::Configuration(format!(
                "token ttl must be positive, got {} minutes",
                config.token_ttl_minutes
            )));
        }
        token_expiry(config.token_ttl_minutes, Utc::now())?;

        let dummy_hash = hash_password(&TokenStore::generate_token())?;

        TokenStore::create_table(db.pool()).await?;
        info!(
            "Authenticator ready (token ttl {} minutes)",
            config.token_ttl_minutes
        );

        Ok(Self {
            db,
            config,
            dummy_hash,
        })
    }

    /// Verify a username and password and issue a fresh token.
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<IssuedToken> {
        // The session must be released before the token insert below
        let user = {
            let mut session = self.db.session().await?;
            session.find_user_by_username(&credentials.username).await?
        };

        let user = match user {
            Some(user) if verify_password(&user.password_hash, &credentials.password) => user,
            Some(_) => {
                warn!("Login failed for {}: wrong password", credentials.username);
                return Err(UserError::InvalidCredentials);
            }
            None => {
                verify_password(&self.dummy_hash, &credentials.password);
                warn!("Login failed for {}: unknown user", credentials.username);
                return Err(UserError::InvalidCredentials);
            }
        };

        let token = TokenStore::generate_token();
        let expires_at = token_expiry(self.config.token_ttl_minutes, Utc::now())?;
        TokenStore::insert(self.db.pool(), &token, user.id, expires_at).await?;

        info!("User {} logged in as {}", user.username, user.role);
        Ok(IssuedToken::bearer(
            token,
            expires_at,
            CallerIdentity::from(&user),
        ))
    }

    /// Resolve a bearer token to the identity of its owner.
    pub async fn verify_token(&self, token: &str) -> Result<CallerIdentity> {
        let row = TokenStore::find(self.db.pool(), token)
            .await?
            .ok_or(UserError::InvalidToken)?;

        if row.expires_at <= Utc::now() {
            debug!("Rejecting expired token for user {}", row.user_id);
            TokenStore::delete(self.db.pool(), token).await?;
            return Err(UserError::TokenExpired);
        }

        Ok(row.identity())
    }

    /// Revoke a token. Returns whether it was live.
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let removed = TokenStore::delete(self.db.pool(), token).await?;
        if removed {
            debug!("Token revoked");
        }
        Ok(removed)
    }

    /// Remove every expired token from the store.
    pub async fn prune_expired(&self) -> Result<u64> {
        TokenStore::delete_expired(self.db.pool(), Utc::now()).await
    }
}

/// Expiry of a token issued at `now`, or a configuration error when the
/// ttl does not fit in a timestamp.
fn token_expiry(ttl_minutes: i64, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    Duration::try_minutes(ttl_minutes)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            UserError::Configuration(format!(
                "token ttl of {} minutes is out of range",
                ttl_minutes
            ))
        })
}
