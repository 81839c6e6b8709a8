mod accounts;
mod collect;

use clap::{Parser, Subcommand, ValueEnum};
use poltok_core::Category;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "poltok")]
#[command(about = "Collects TikTok Research API data for a registry of political accounts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a retrieval against the Research API
    Collect {
        #[command(subcommand)]
        command: collect::CollectCommands,
    },
    /// Inspect and validate the account registry
    Accounts {
        #[command(subcommand)]
        command: accounts::AccountsCommands,
    },
}

/// Registry category filter shared by several subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CategoryArg {
    /// Party-run accounts only
    Party,
    /// Individual politician and commentator accounts only
    Personality,
    /// The whole registry
    All,
}

impl CategoryArg {
    fn to_filter(self) -> Option<Category> {
        match self {
            CategoryArg::Party => Some(Category::Party),
            CategoryArg::Personality => Some(Category::Personality),
            CategoryArg::All => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = poltok_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Collect { command } => collect::handle_collect(&config, command).await,
        Commands::Accounts { command } => accounts::handle_accounts(&config, command),
    }
}
