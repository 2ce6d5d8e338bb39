use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] database::DatabaseError),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or unknown token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl UserError {
    /// True when the caller failed to prove who they are, as opposed to an
    /// infrastructure fault on our side.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            UserError::InvalidCredentials | UserError::InvalidToken | UserError::TokenExpired
        )
    }
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Database(err.into())
    }
}

pub type Result<T> = std::result::Result<T, UserError>;
