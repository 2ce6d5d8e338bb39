use anyhow::Result;
use colored::*;

use super::open_database;
use crate::{config::LmsConfig, OutputFormat};

/// Create a branch
pub async fn add(config: &LmsConfig, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Branch name must not be empty");
    }

    let db = open_database(config).await?;
    let branch = {
        let mut store = db.session().await?;
        store.insert_branch(name).await?
    };
    db.close().await;

    println!(
        "{} branch {} ({})",
        "Created".green().bold(),
        branch.id,
        branch.name
    );
    Ok(())
}

/// List all branches
pub async fn list(config: &LmsConfig, format: OutputFormat) -> Result<()> {
    let db = open_database(config).await?;
    let branches = {
        let mut store = db.session().await?;
        store.list_branches().await?
    };
    db.close().await;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&branches)?);
        }
        OutputFormat::Text => {
            if branches.is_empty() {
                println!("{}", "No branches".yellow());
                return Ok(());
            }
            println!("{:>6}  {}", "ID".bold(), "NAME".bold());
            for branch in &branches {
                println!("{:>6}  {}", branch.id, branch.name);
            }
        }
    }

    Ok(())
}
