use crate::{Database, Result};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::info;

/// Database initialization configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// SQLite connection url, e.g. `sqlite:data/lms.db`
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Seconds to wait for a free connection before failing
    pub acquire_timeout_secs: u64,
    /// Whether to create tables on initialization
    pub create_tables: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/lms.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            create_tables: true,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration for the given url with default pool settings
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_acquire_timeout_secs(mut self, secs: u64) -> Self {
        self.acquire_timeout_secs = secs;
        self
    }

    /// Set whether to create tables on initialization
    pub fn with_create_tables(mut self, create: bool) -> Self {
        self.create_tables = create;
        self
    }
}

/// Initialize the database with the given configuration
pub async fn initialize_database(config: DatabaseConfig) -> Result<Arc<Database>> {
    info!("Initializing database with configuration");

    let db = Database::connect(&config).await?;

    if config.create_tables {
        create_tables(db.pool()).await?;
    }

    Ok(Arc::new(db))
}

/// Initialize a throwaway in-memory database with all tables created.
pub async fn initialize_in_memory() -> Result<Arc<Database>> {
    let db = Database::in_memory().await?;
    create_tables(db.pool()).await?;
    Ok(Arc::new(db))
}

/// Create the identity tables if they are missing.
///
/// Every statement is idempotent, so this runs on each start.
pub async fn create_tables(pool: &Pool<Sqlite>) -> Result<()> {
    info!("Creating identity tables");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS branches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL CHECK (role IN ('SuperAdmin', 'Admin', 'Teacher')),
            branch_id INTEGER REFERENCES branches(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS study_groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            teacher_id INTEGER NOT NULL REFERENCES users(id),
            branch_id INTEGER NOT NULL REFERENCES branches(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            group_id INTEGER NOT NULL REFERENCES study_groups(id),
            branch_id INTEGER NOT NULL REFERENCES branches(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for the scoped list queries
    for statement in [
        "CREATE INDEX IF NOT EXISTS idx_users_role_branch ON users(role, branch_id)",
        "CREATE INDEX IF NOT EXISTS idx_study_groups_teacher ON study_groups(teacher_id)",
        "CREATE INDEX IF NOT EXISTS idx_study_groups_branch ON study_groups(branch_id)",
        "CREATE INDEX IF NOT EXISTS idx_students_group ON students(group_id)",
        "CREATE INDEX IF NOT EXISTS idx_students_branch ON students(branch_id)",
    ] {
        sqlx::query(statement).execute(pool).await?;
    }

    info!("Identity tables ready");

    Ok(())
}
