//! Layered configuration: YAML file, then environment, then CLI flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG_PATH: &str = "config/lms.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmsConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub host: String,
    pub port: u16,
    pub token_ttl_minutes: i64,
    pub log_dir: Option<PathBuf>,
}

impl Default for LmsConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/lms.db".to_string(),
            max_connections: 5,
            acquire_timeout_secs: 30,
            host: "0.0.0.0".to_string(),
            port: 8000,
            token_ttl_minutes: 60,
            log_dir: None,
        }
    }
}

impl LmsConfig {
    /// Load the file (if any) and apply process environment overrides.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Override fields from `LMS_*` variables found by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("LMS_DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(value) = lookup("LMS_MAX_CONNECTIONS") {
            self.max_connections = parse_var("LMS_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = lookup("LMS_ACQUIRE_TIMEOUT_SECS") {
            self.acquire_timeout_secs = parse_var("LMS_ACQUIRE_TIMEOUT_SECS", &value)?;
        }
        if let Some(host) = lookup("LMS_HOST") {
            self.host = host;
        }
        if let Some(value) = lookup("LMS_PORT") {
            self.port = parse_var("LMS_PORT", &value)?;
        }
        if let Some(value) = lookup("LMS_TOKEN_TTL_MINUTES") {
            self.token_ttl_minutes = parse_var("LMS_TOKEN_TTL_MINUTES", &value)?;
        }
        if let Some(dir) = lookup("LMS_LOG_DIR").filter(|d| !d.is_empty()) {
            self.log_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    pub fn database_config(&self) -> database::DatabaseConfig {
        database::DatabaseConfig::new(self.database_url.clone())
            .with_max_connections(self.max_connections)
            .with_acquire_timeout_secs(self.acquire_timeout_secs)
    }

    pub fn auth_config(&self) -> user::AuthConfig {
        user::AuthConfig::default().with_token_ttl_minutes(self.token_ttl_minutes)
    }

    pub fn api_config(&self) -> api::ApiConfig {
        api::ApiConfig::new()
            .with_host(self.host.clone())
            .with_port(self.port)
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{} has an invalid value: {:?}", name, value))
}
