use anyhow::Result;
use colored::*;
use user::Authenticator;

use super::open_database;
use crate::config::LmsConfig;

/// Delete expired access tokens
pub async fn prune(config: &LmsConfig) -> Result<()> {
    let db = open_database(config).await?;
    let authenticator = Authenticator::new(db.clone(), config.auth_config()).await?;

    let removed = authenticator.prune_expired().await?;
    db.close().await;

    println!("{} {} expired tokens", "Pruned".green().bold(), removed);
    Ok(())
}
