//! # VACTL CLI
//!
//! Command-line interface for the Visitors Operator.
//!
//! ## Usage
//!
//! ```bash
//! # List all VisitorsApp resources
//! vactl list visitorsapp
//!
//! # Show status of a VisitorsApp and its tiers
//! vactl status visitorsapp acme --namespace default
//!
//! # Trigger reconciliation for a specific VisitorsApp
//! vactl reconcile va acme
//! ```

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use kube::Client;

mod list;
mod reconcile;
mod status;

/// Visitors Operator CLI
#[derive(Parser)]
#[command(name = "vactl")]
#[command(
    about = "Visitors Operator CLI",
    long_about = None,
    after_help = "\
Available resource types:
  visitorsapp (or 'va') - VisitorsApp resource

Examples:
  vactl list visitorsapp
  vactl reconcile va acme
  vactl status visitorsapp acme --namespace default
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to "default")
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger reconciliation for a VisitorsApp resource
    Reconcile {
        #[arg(value_enum, value_name = "RESOURCE_TYPE")]
        resource_type: ResourceType,

        /// Name of the VisitorsApp resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List VisitorsApp resources
    List {
        #[arg(value_enum, value_name = "RESOURCE_TYPE")]
        resource_type: Option<ResourceType>,
    },
    /// Show status of a VisitorsApp resource and the workloads it owns
    Status {
        #[arg(value_enum, value_name = "RESOURCE_TYPE")]
        resource_type: ResourceType,

        /// Name of the VisitorsApp resource
        #[arg(value_name = "NAME")]
        name: String,
    },
}

/// Resource types supported by vactl
#[derive(Clone, ValueEnum)]
enum ResourceType {
    /// VisitorsApp resource; short form 'va'
    #[value(name = "visitorsapp", alias = "va")]
    VisitorsApp,
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vactl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::Reconcile {
            resource_type: ResourceType::VisitorsApp,
            name,
        } => reconcile::reconcile_command(client, name, cli.namespace).await,
        Commands::List { resource_type } => {
            if resource_type.is_none() {
                return Err(anyhow!(
                    "Resource type is required.\n\n\
                    Available resource types:\n\
                      visitorsapp (or 'va') - VisitorsApp resource\n\n\
                    Example: vactl list visitorsapp"
                ));
            }
            list::list_command(client, cli.namespace).await
        }
        Commands::Status {
            resource_type: ResourceType::VisitorsApp,
            name,
        } => status::status_command(client, name, cli.namespace).await,
    }
}
