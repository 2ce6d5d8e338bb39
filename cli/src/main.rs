use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::{branch, health, serve, superadmin, tokens};
use config::LmsConfig;

/// lmsctl - Command line interface for the LMS admin backend
#[derive(Parser)]
#[command(name = "lmsctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML configuration file (defaults to config/lms.yaml when present)
    #[arg(short, long, global = true, env = "LMS_CONFIG")]
    config: Option<PathBuf>,

    /// Database url, overriding the file and LMS_DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Branch management commands
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },

    /// SuperAdmin account management
    Superadmin {
        #[command(subcommand)]
        action: SuperadminAction,
    },

    /// Query a running server's health endpoint
    Health {
        /// Base url of the server
        #[arg(long, default_value = "http://localhost:8000")]
        url: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Access token maintenance
    Tokens {
        #[command(subcommand)]
        action: TokensAction,
    },
}

#[derive(Subcommand)]
enum BranchAction {
    /// Create a branch
    Add {
        /// Branch name
        name: String,
    },

    /// List all branches
    List {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum SuperadminAction {
    /// Create a SuperAdmin account
    Add {
        #[arg(long)]
        username: String,

        #[arg(long, env = "LMS_SUPERADMIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Optional home branch
        #[arg(long)]
        branch_id: Option<i64>,
    },
}

#[derive(Subcommand)]
enum TokensAction {
    /// Delete expired access tokens
    Prune,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = LmsConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let log_level = if cli.verbose { "debug" } else { "info" };
    let _guard = logging::init_logging(log_level, config.log_dir.as_deref())?;

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve::execute(&config).await?;
        }
        Commands::Branch { action } => match action {
            BranchAction::Add { name } => branch::add(&config, &name).await?,
            BranchAction::List { format } => branch::list(&config, format).await?,
        },
        Commands::Superadmin { action } => match action {
            SuperadminAction::Add {
                username,
                password,
                branch_id,
            } => superadmin::add(&config, &username, &password, branch_id).await?,
        },
        Commands::Health { url, format } => health::execute(&url, format).await?,
        Commands::Tokens { action } => match action {
            TokensAction::Prune => tokens::prune(&config).await?,
        },
    }

    Ok(())
}
