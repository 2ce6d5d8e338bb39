use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use user::Authenticator;

use super::open_database;
use crate::config::LmsConfig;

/// Build the collaborators and run the server until shutdown.
pub async fn execute(config: &LmsConfig) -> Result<()> {
    info!("Starting LMS server");

    let db = open_database(config).await?;
    let authenticator = Authenticator::new(db.clone(), config.auth_config())
        .await
        .context("Failed to initialize authenticator")?;

    let pruned = authenticator.prune_expired().await?;
    if pruned > 0 {
        info!("Removed {} expired tokens at startup", pruned);
    }

    api::start_server_with_config(db, Arc::new(authenticator), config.api_config())
        .await
        .with_context(|| format!("Server failed on {}:{}", config.host, config.port))?;

    info!("LMS server shut down cleanly");
    Ok(())
}
