//! Registry inspection commands.
//!
//! These never touch the API; they exist so a registry edit can be checked
//! before the next collection run picks it up.

use std::path::PathBuf;

use anyhow::Context;
use clap::Subcommand;
use poltok_core::{load_accounts, AppConfig, Category};

use crate::CategoryArg;

/// Sub-commands available under `accounts`.
#[derive(Debug, Subcommand)]
pub(crate) enum AccountsCommands {
    /// Load the registry and report whether it passes validation
    Validate {
        /// Accounts file to read instead of POLTOK_ACCOUNTS_PATH
        #[arg(long)]
        accounts: Option<PathBuf>,
    },
    /// Print the registry, one account per line
    List {
        /// Accounts file to read instead of POLTOK_ACCOUNTS_PATH
        #[arg(long)]
        accounts: Option<PathBuf>,

        /// Restrict the listing to one category
        #[arg(long, value_enum, default_value = "all")]
        category: CategoryArg,
    },
}

pub(crate) fn handle_accounts(config: &AppConfig, command: AccountsCommands) -> anyhow::Result<()> {
    match command {
        AccountsCommands::Validate { accounts } => {
            let path = accounts.unwrap_or_else(|| config.accounts_path.clone());
            let registry = load_accounts(&path)
                .with_context(|| format!("registry {} failed validation", path.display()))?;
            println!(
                "{}: {} account(s) ok ({} party, {} personality)",
                path.display(),
                registry.accounts.len(),
                registry.for_category(Some(Category::Party)).len(),
                registry.for_category(Some(Category::Personality)).len(),
            );
            Ok(())
        }
        AccountsCommands::List { accounts, category } => {
            let path = accounts.unwrap_or_else(|| config.accounts_path.clone());
            let registry = load_accounts(&path)
                .with_context(|| format!("failed to load registry {}", path.display()))?;
            for account in registry.for_category(category.to_filter()) {
                let party = account.party.as_deref().unwrap_or("-");
                println!(
                    "{}\t{}\t{}\t{}",
                    account.id, account.category, account.name, party
                );
            }
            Ok(())
        }
    }
}
