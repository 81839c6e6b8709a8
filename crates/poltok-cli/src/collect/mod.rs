//! Collection command handlers for the CLI.
//!
//! These run after configuration and the registry are loaded. Per-account
//! failures are logged and counted rather than propagated so a single bad
//! account does not abort the full run; only a credential rejection stops
//! everything, since every later request would fail the same way.

mod account;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Subcommand};
use futures::stream::{self, StreamExt};
use poltok_core::{AccountConfig, AccountsFile, AppConfig, Category, Retrieval};
use poltok_research::{ResearchClient, ResearchClientConfig};
use poltok_store::FileStore;
use uuid::Uuid;

use crate::CategoryArg;
use account::{collect_account, AccountOutcome};

/// Sub-commands available under `collect`.
#[derive(Debug, Subcommand)]
pub(crate) enum CollectCommands {
    /// Fetch public profile fields for the selected accounts
    Profile(CollectArgs),
    /// Fetch the full list of accounts each selected account follows
    Following(CollectArgs),
    /// Fetch the videos each selected account has reposted
    Reposted(CollectArgs),
    /// Query the videos each selected account posted in a date window
    Videos(VideosArgs),
}

/// Selection and output flags shared by every collect sub-command.
#[derive(Debug, Args)]
pub(crate) struct CollectArgs {
    /// Restrict collection to one registry category
    #[arg(long, value_enum, default_value = "all")]
    pub(crate) category: CategoryArg,

    /// Collect a single account by registry id
    #[arg(long)]
    pub(crate) account: Option<String>,

    /// Accounts file to read instead of POLTOK_ACCOUNTS_PATH
    #[arg(long)]
    pub(crate) accounts: Option<PathBuf>,

    /// Output directory to write instead of POLTOK_OUTPUT_DIR
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,

    /// List the selected accounts without calling the API
    #[arg(long)]
    pub(crate) dry_run: bool,
}

/// `collect videos` takes the shared flags plus an inclusive date window.
#[derive(Debug, Args)]
pub(crate) struct VideosArgs {
    #[command(flatten)]
    pub(crate) common: CollectArgs,

    /// First day of the query window (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) since: NaiveDate,

    /// Last day of the query window (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub(crate) until: NaiveDate,
}

/// A retrieval task plus the arguments that only some tasks carry.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RetrievalPlan {
    Profile,
    Following,
    Reposted,
    Videos { since: NaiveDate, until: NaiveDate },
}

impl RetrievalPlan {
    pub(crate) fn retrieval(self) -> Retrieval {
        match self {
            RetrievalPlan::Profile => Retrieval::Profile,
            RetrievalPlan::Following => Retrieval::Following,
            RetrievalPlan::Reposted => Retrieval::Reposted,
            RetrievalPlan::Videos { .. } => Retrieval::Videos,
        }
    }
}

/// Counters and identifiers for one finished collection run.
#[derive(Debug)]
pub(crate) struct CollectionSummary {
    pub(crate) run_id: Uuid,
    pub(crate) succeeded: usize,
    pub(crate) skipped: usize,
    pub(crate) failed: Vec<String>,
    pub(crate) records: usize,
}

/// Resolve arguments, run the retrieval, and report the outcome.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded, the selection is
/// invalid, the access token is missing, the run is aborted by an
/// authentication failure, or any account fails. Skipped accounts do not
/// count as failures.
pub(crate) async fn handle_collect(
    config: &AppConfig,
    command: CollectCommands,
) -> anyhow::Result<()> {
    let (plan, args) = match command {
        CollectCommands::Profile(args) => (RetrievalPlan::Profile, args),
        CollectCommands::Following(args) => (RetrievalPlan::Following, args),
        CollectCommands::Reposted(args) => (RetrievalPlan::Reposted, args),
        CollectCommands::Videos(videos) => {
            anyhow::ensure!(
                videos.since <= videos.until,
                "--since {} is after --until {}",
                videos.since,
                videos.until
            );
            let plan = RetrievalPlan::Videos {
                since: videos.since,
                until: videos.until,
            };
            (plan, videos.common)
        }
    };
    let retrieval = plan.retrieval();

    let accounts_path = args.accounts.unwrap_or_else(|| config.accounts_path.clone());
    let registry = poltok_core::load_accounts(&accounts_path)
        .with_context(|| format!("failed to load accounts from {}", accounts_path.display()))?;
    let selected = select_accounts(&registry, args.category.to_filter(), args.account.as_deref())?;

    if selected.is_empty() {
        println!("no accounts matched the selection; nothing to collect");
        return Ok(());
    }

    if args.dry_run {
        println!(
            "dry-run: would collect {retrieval} for {} account(s):",
            selected.len()
        );
        for account in &selected {
            println!("  {} ({}, {})", account.id, account.name, account.category);
        }
        return Ok(());
    }

    let token = config
        .require_access_token()
        .context("collect commands call the Research API; set TIKTOK_ACCESS_TOKEN")?;
    let client = ResearchClient::with_base_url(
        ResearchClientConfig {
            access_token: token.to_owned(),
            timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            min_request_interval_ms: config.min_request_interval_ms,
            max_pages: config.max_pages,
            page_size: config.page_size,
        },
        &config.api_base_url,
    )?;

    let out_dir = args.out.unwrap_or_else(|| config.output_dir.clone());
    let store = FileStore::new(out_dir);

    let summary = run_collect(
        &client,
        &store,
        plan,
        selected,
        config.max_concurrent_accounts,
    )
    .await?;

    println!(
        "run {} ({retrieval}): {} succeeded, {} skipped, {} failed, {} records",
        summary.run_id,
        summary.succeeded,
        summary.skipped,
        summary.failed.len(),
        summary.records
    );
    if !summary.failed.is_empty() {
        anyhow::bail!("collection failed for: {}", summary.failed.join(", "));
    }
    Ok(())
}

/// Pick the accounts a collect run should cover.
///
/// The category filter narrows the registry first; `--account` then selects
/// a single id within that slice and errors if nothing matches.
fn select_accounts(
    registry: &AccountsFile,
    filter: Option<Category>,
    account_id: Option<&str>,
) -> anyhow::Result<Vec<AccountConfig>> {
    let mut selected = registry.for_category(filter);
    if let Some(id) = account_id {
        selected.retain(|account| account.id.eq_ignore_ascii_case(id));
        if selected.is_empty() {
            anyhow::bail!("account '{id}' is not in the registry under the selected category");
        }
    }
    Ok(selected)
}

/// Run one retrieval across `accounts`, writing raw documents as accounts
/// finish and the processed per-category files at the end.
///
/// Accounts are processed up to `max_concurrent` at a time; they all share
/// the client's request pacer, so concurrency never multiplies the request
/// rate.
///
/// # Errors
///
/// Only an authentication rejection (or a processed-file write failure)
/// aborts with an error; everything else lands in the summary counters.
pub(crate) async fn run_collect(
    client: &ResearchClient,
    store: &FileStore,
    plan: RetrievalPlan,
    accounts: Vec<AccountConfig>,
    max_concurrent: usize,
) -> anyhow::Result<CollectionSummary> {
    let run_id = Uuid::new_v4();
    let retrieval = plan.retrieval();
    tracing::info!(
        run_id = %run_id,
        retrieval = %retrieval,
        accounts = accounts.len(),
        "starting collection run"
    );

    let mut summary = CollectionSummary {
        run_id,
        succeeded: 0,
        skipped: 0,
        failed: Vec::new(),
        records: 0,
    };
    let mut rows_by_category: BTreeMap<Category, Vec<serde_json::Value>> = BTreeMap::new();

    let mut outcomes = stream::iter(accounts)
        .map(|account| async move {
            let outcome = collect_account(client, store, plan, &account, run_id).await;
            (account, outcome)
        })
        .buffer_unordered(max_concurrent.max(1));

    while let Some((account, outcome)) = outcomes.next().await {
        match outcome {
            AccountOutcome::Succeeded { records, rows } => {
                summary.succeeded += 1;
                summary.records += records;
                rows_by_category
                    .entry(account.category)
                    .or_default()
                    .extend(rows);
            }
            AccountOutcome::Skipped => summary.skipped += 1,
            AccountOutcome::Failed => summary.failed.push(account.id),
            AccountOutcome::Fatal(err) => {
                return Err(err).context("access token rejected, aborting the collection run");
            }
        }
    }
    summary.failed.sort();

    for (category, rows) in &rows_by_category {
        let path = store.write_processed(retrieval, *category, rows)?;
        tracing::info!(path = %path.display(), rows = rows.len(), "wrote processed rows");
    }

    tracing::info!(
        run_id = %run_id,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed.len(),
        records = summary.records,
        "collection run finished"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
