//! Authentication types

use chrono::{DateTime, Utc};
use entities::CallerIdentity;
use serde::{Deserialize, Serialize};

/// Authenticator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Lifetime of an issued bearer token, in minutes
    pub token_ttl_minutes: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_minutes: 60,
        }
    }
}

impl AuthConfig {
    pub fn with_token_ttl_minutes(mut self, minutes: i64) -> Self {
        self.token_ttl_minutes = minutes;
        self
    }
}

/// Username and password presented at login
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A freshly issued bearer token.
///
/// `access_token` is only ever held in memory here; the store keeps a
/// SHA-256 fingerprint of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    pub identity: CallerIdentity,
}

impl IssuedToken {
    pub fn bearer(
        access_token: String,
        expires_at: DateTime<Utc>,
        identity: CallerIdentity,
    ) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_at,
            identity,
        }
    }
}
