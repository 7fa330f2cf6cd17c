//! Cluster Portal CLI
//!
//! A command-line view of what the portal serves: ArgoCD application
//! status and aggregated cluster metrics.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Cluster Portal CLI
#[derive(Parser)]
#[command(name = "portalctl")]
#[command(author, version, about = "CLI for the Cluster Portal", long_about = None)]
pub struct Cli {
    /// Portal endpoint URL (can also be set via PORTALCTL_API_URL env var)
    #[arg(long, env = "PORTALCTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List ArgoCD applications
    Apps,

    /// Show cluster-wide resource totals
    Summary,

    /// Show per-namespace resource usage
    Namespaces,

    /// Show per-pod resource usage
    Pods {
        /// Only show pods in this namespace
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let client = client::ApiClient::new(&cli.api_url)?;

    let result = match cli.command {
        Commands::Apps => commands::apps(&client, cli.format).await,
        Commands::Summary => commands::summary(&client, cli.format).await,
        Commands::Namespaces => commands::namespaces(&client, cli.format).await,
        Commands::Pods { namespace } => commands::pods(&client, cli.format, namespace).await,
    };

    if let Err(err) = &result {
        output::print_error(&format!("{err:#}"));
    }
    result
}
