use sqlx::{
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub mod error;
pub mod init;
pub mod store;

pub use error::{DatabaseError, Result};
pub use init::{initialize_database, initialize_in_memory, DatabaseConfig};
pub use store::IdentityStore;

/// Connection pool over the identity database.
///
/// One `Database` is created at process start and shared behind an `Arc`.
/// Request handlers never hold the pool directly; they open an
/// [`IdentityStore`] session with [`Database::session`].
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect to the database described by `config`.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(path) = database_file(&config.url) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Connecting to database at: {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DatabaseError::Configuration(format!("Invalid database url: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_with(options)
            .await?;

        debug!("Database connection established");

        Ok(Self { pool })
    }

    /// Open a private in-memory database.
    ///
    /// The pool is pinned to a single connection that never expires, because
    /// every SQLite `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Acquire a connection-scoped store session.
    ///
    /// The connection goes back to the pool when the session is dropped.
    pub async fn session(&self) -> Result<IdentityStore> {
        let conn: PoolConnection<Sqlite> = self.pool.acquire().await?;
        Ok(IdentityStore::new(conn))
    }

    /// Round-trip a trivial query to prove the database is reachable.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Check if a table exists
    pub async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let query = r#"
            SELECT COUNT(*) as count
            FROM sqlite_master
            WHERE type='table' AND name=?
        "#;

        let result: (i32,) = sqlx::query_as(query)
            .bind(table_name)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0 > 0)
    }

    /// Close every pooled connection. Called once at shutdown.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}

/// Resolve the on-disk file behind a `sqlite:` url, if there is one.
fn database_file(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = rest.split('?').next().unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
