use anyhow::{bail, Result};
use colored::*;
use database::DatabaseError;
use entities::{BranchId, NewUser, Role};
use tracing::info;

use super::open_database;
use crate::config::LmsConfig;

/// Create a SuperAdmin. This is the only way one comes to exist.
pub async fn add(
    config: &LmsConfig,
    username: &str,
    password: &str,
    branch_id: Option<BranchId>,
) -> Result<()> {
    if username.trim().is_empty() || password.trim().is_empty() {
        bail!("Username and password must not be empty");
    }

    let password_hash = user::hash_password(password)?;
    let db = open_database(config).await?;

    let result = {
        let mut store = db.session().await?;
        if let Some(id) = branch_id {
            if store.find_branch(id).await?.is_none() {
                bail!("Branch {} does not exist", id);
            }
        }
        store
            .insert_user(&NewUser {
                username: username.to_string(),
                password_hash,
                role: Role::SuperAdmin,
                branch_id,
            })
            .await
    };
    db.close().await;

    let user = match result {
        Ok(user) => user,
        Err(DatabaseError::UniqueViolation(_)) => bail!("User {} already exists", username),
        Err(e) => return Err(e.into()),
    };

    info!("Created SuperAdmin {} ({})", user.id, user.username);
    println!(
        "{} SuperAdmin {} ({})",
        "Created".green().bold(),
        user.id,
        user.username
    );
    Ok(())
}
