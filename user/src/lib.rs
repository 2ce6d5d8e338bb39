//! Credentials and bearer tokens for the LMS.
//!
//! Passwords are stored as Argon2id hashes. Tokens are random 256-bit
//! values handed to the client once; only their SHA-256 fingerprint is kept.

pub mod auth;
pub mod error;
pub mod password;

pub use auth::{AuthConfig, Authenticator, Credentials, IssuedToken, TokenStore};
pub use error::{Result, UserError};
pub use password::{hash_password, verify_password};
