use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Failures surfaced by the identity store.
///
/// Constraint violations are split out from infrastructure faults so callers
/// can report a conflict to the client instead of a server error.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database query error: {0}")]
    Query(sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// True for failures caused by the data rather than the database itself.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            DatabaseError::UniqueViolation(_) | DatabaseError::ForeignKeyViolation(_)
        )
    }
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return DatabaseError::UniqueViolation(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        DatabaseError::Query(err)
    }
}
