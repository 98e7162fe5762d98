//! Backlog CLI - command-line driver for the work item client.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::limits::OutputFormat;

#[derive(Parser)]
#[command(name = "backlog")]
#[command(version)]
#[command(about = "A rate-limited batch client for Azure DevOps work items")]
#[command(
    long_about = "Backlog queries and fetches work items from an Azure DevOps project over \
the Work Item Tracking REST API. Large id sets are fetched in server-sized \
chunks, every call is paced by a client-side rate limiter, and the server's \
quota headers are honored when it starts counting."
)]
#[command(after_long_help = r#"EXAMPLES
    Fetch one work item:
        $ backlog items get 4312

    List active bugs assigned to one person:
        $ backlog items query --state Active --item-type Bug --assigned-to dana@acme.example

    Everything under an area, most recently changed first:
        $ backlog items query --area 'Product\Web' --order-by System.ChangedDate --descending --limit 50

    Comment on a work item:
        $ backlog comments add 4312 "Deployed to staging"

    Inspect the rate limit picture as JSON:
        $ backlog limits --output json

CONFIGURATION
    Backlog reads configuration from:
      1. ~/.config/backlog/config.toml (or $XDG_CONFIG_HOME/backlog/config.toml)
      2. backlog.toml in the current directory
      3. Environment variables (BACKLOG_* prefix)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    BACKLOG_SERVICE_ORGANIZATION   Organization name
    BACKLOG_SERVICE_PROJECT        Project name
    BACKLOG_SERVICE_TOKEN          Personal access token
    BACKLOG_SERVICE_HOST           Service host (default: dev.azure.com)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work item operations
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
    /// Comment operations
    Comments {
        #[command(subcommand)]
        action: CommentsAction,
    },
    /// Show the current rate limit picture
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    /// Fetch a single work item by id
    Get {
        /// Work item id
        id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Query work items by filters
    Query {
        #[command(flatten)]
        filters: QueryArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

/// Filter and ordering options for work item queries.
#[derive(Debug, Clone, clap::Args)]
struct QueryArgs {
    /// Match any of these states (e.g. Active, Resolved) - repeatable
    #[arg(short = 's', long = "state")]
    states: Vec<String>,

    /// Match any of these work item types (e.g. Bug, Task) - repeatable
    #[arg(short = 't', long = "item-type")]
    item_types: Vec<String>,

    /// Match any of these assignees - repeatable
    #[arg(long = "assigned-to")]
    assigned_to: Vec<String>,

    /// Match this area path and everything under it - repeatable
    #[arg(long = "area")]
    areas: Vec<String>,

    /// Match this iteration path and everything under it - repeatable
    #[arg(long = "iteration")]
    iterations: Vec<String>,

    /// Field to order matches by (e.g. System.ChangedDate)
    #[arg(long = "order-by")]
    order_by: Option<String>,

    /// Sort descending instead of ascending
    #[arg(short = 'd', long)]
    descending: bool,

    /// Keep only the first N matches
    #[arg(short = 'l', long)]
    limit: Option<usize>,
}

#[derive(Subcommand)]
enum CommentsAction {
    /// List all comments on a work item
    List {
        /// Work item id
        id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Add a comment to a work item
    Add {
        /// Work item id
        id: i32,

        /// Comment text
        text: String,
    },
    /// Fetch comments for several work items at once
    Batch {
        /// Work item id(s) - can specify multiple
        #[arg(required = true)]
        ids: Vec<i32>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing for non-TTY mode (structured logging)
    // Only initialize if not connected to a TTY
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("backlog=info,backlog_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let config = config::Config::load();

    let cli = Cli::parse();

    match cli.command {
        Commands::Items { action } => {
            commands::items::handle_items(action, &config).await?;
        }
        Commands::Comments { action } => {
            commands::comments::handle_comments(action, &config).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(output, &config).await?;
        }
    }

    Ok(())
}
