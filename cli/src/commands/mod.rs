pub mod branch;
pub mod health;
pub mod serve;
pub mod superadmin;
pub mod tokens;

use anyhow::{Context, Result};
use database::Database;
use std::sync::Arc;

use crate::config::LmsConfig;

/// Open the configured database, creating tables when missing.
pub async fn open_database(config: &LmsConfig) -> Result<Arc<Database>> {
    database::initialize_database(config.database_config())
        .await
        .with_context(|| format!("Failed to open database at {}", config.database_url))
}
