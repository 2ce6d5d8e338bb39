use anyhow::{anyhow, Result};
use api::models::HealthResponse;
use colored::*;
use serde_json::json;
use std::time::Duration;

use crate::OutputFormat;

/// Query `{url}/health` and print the result
pub async fn execute(url: &str, format: OutputFormat) -> Result<()> {
    let endpoint = format!("{}/health", url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    let response = match client.get(&endpoint).send().await {
        Ok(response) => response,
        Err(e) => {
            if format == OutputFormat::Json {
                let offline = json!({
                    "status": "offline",
                    "endpoint": endpoint,
                    "message": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&offline)?);
            }
            return Err(anyhow!("API server at {} is not reachable: {}", endpoint, e));
        }
    };

    let status_code = response.status();
    let health: HealthResponse = response.json().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&health)?),
        OutputFormat::Text => print_health_text(&endpoint, &health),
    }

    if !status_code.is_success() {
        return Err(anyhow!("API server reported status {}", status_code));
    }
    Ok(())
}

fn print_health_text(endpoint: &str, health: &HealthResponse) {
    println!("{}", "=== LMS Health Check ===".bold());
    println!();

    let status = match health.status.as_str() {
        "healthy" => "HEALTHY".green().bold(),
        "degraded" => "DEGRADED".yellow().bold(),
        _ => health.status.to_uppercase().red().bold(),
    };

    println!("Overall Status: {}", status);
    println!("Endpoint: {}", endpoint);
    println!("Version: {}", health.version);
    println!("Timestamp: {}", health.timestamp.to_rfc3339());

    let database = if health.database.connected {
        "connected".green()
    } else {
        "disconnected".red()
    };
    println!("Database: {} ({})", database, health.database.message);
}
