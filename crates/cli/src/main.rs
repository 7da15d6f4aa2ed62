//! Node Monitor CLI
//!
//! A command-line tool for validating rule files and querying a running
//! node-monitor daemon for active alerts and health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{alerts, check, status};

/// Node Monitor CLI
#[derive(Parser)]
#[command(name = "nmctl")]
#[command(author, version, about = "CLI for the Node Monitor alerting daemon", long_about = None)]
pub struct Cli {
    /// Daemon API URL (can also be set via NM_API_URL env var)
    #[arg(long, env = "NM_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a rules file without starting the daemon
    Check {
        /// Path to the rules file
        #[arg(long, default_value = "rules.yml")]
        rules: String,
    },

    /// List currently firing alerts from a running daemon
    Alerts,

    /// Show daemon health and readiness
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { rules } => {
            check::check_rules(&rules, cli.format)?;
        }
        Commands::Alerts => {
            let client = client::ApiClient::new(&cli.api_url)?;
            alerts::show_alerts(&client, cli.format).await?;
        }
        Commands::Status => {
            let client = client::ApiClient::new(&cli.api_url)?;
            status::show_status(&client, cli.format).await?;
        }
    }

    Ok(())
}
