//! Per-account retrieval and raw persistence.
//!
//! Each account runs to completion or failure on its own; the outcome tells
//! the run loop how its counters should move.

use chrono::Utc;
use poltok_core::AccountConfig;
use poltok_research::{flatten, ResearchClient, ResearchError};
use poltok_store::{FileStore, RunMeta, StoreError};
use uuid::Uuid;

use super::RetrievalPlan;

/// What happened to one account during a collection run.
pub(super) enum AccountOutcome {
    /// Raw output written; carries the processed rows for aggregation.
    Succeeded {
        records: usize,
        rows: Vec<serde_json::Value>,
    },
    /// The platform reported the account missing; noted and skipped.
    Skipped,
    /// Retrieval or persistence failed; the run continues without it.
    Failed,
    /// The API rejected our credentials; the run must stop.
    Fatal(ResearchError),
}

enum CollectError {
    Research(ResearchError),
    Store(StoreError),
}

impl From<ResearchError> for CollectError {
    fn from(err: ResearchError) -> Self {
        CollectError::Research(err)
    }
}

impl From<StoreError> for CollectError {
    fn from(err: StoreError) -> Self {
        CollectError::Store(err)
    }
}

pub(super) async fn collect_account(
    client: &ResearchClient,
    store: &FileStore,
    plan: RetrievalPlan,
    account: &AccountConfig,
    run_id: Uuid,
) -> AccountOutcome {
    match run_one(client, store, plan, account, run_id).await {
        Ok((records, rows)) => {
            tracing::info!(account = %account.id, records, "account collected");
            AccountOutcome::Succeeded { records, rows }
        }
        Err(CollectError::Research(err @ ResearchError::Auth { .. })) => {
            tracing::error!(account = %account.id, error = %err, "access token rejected");
            AccountOutcome::Fatal(err)
        }
        Err(CollectError::Research(ResearchError::NotFound { .. })) => {
            tracing::warn!(account = %account.id, "account not found on the platform, skipping");
            AccountOutcome::Skipped
        }
        Err(CollectError::Research(err)) => {
            tracing::error!(account = %account.id, error = %err, "retrieval failed for account");
            AccountOutcome::Failed
        }
        Err(CollectError::Store(err)) => {
            tracing::error!(account = %account.id, error = %err, "failed to write raw output");
            AccountOutcome::Failed
        }
    }
}

/// Runs one retrieval for one account, writes the raw document, and returns
/// the record count plus the flattened processed rows.
async fn run_one(
    client: &ResearchClient,
    store: &FileStore,
    plan: RetrievalPlan,
    account: &AccountConfig,
    run_id: Uuid,
) -> Result<(usize, Vec<serde_json::Value>), CollectError> {
    let retrieved_at = Utc::now();
    let meta = RunMeta {
        account,
        retrieval: plan.retrieval(),
        run_id,
        retrieved_at,
    };

    match plan {
        RetrievalPlan::Profile => {
            let profile = client.fetch_user_info(&account.id).await?;
            store.write_run(&meta, std::slice::from_ref(&profile))?;
            let rows = vec![flatten::profile_row(account, &profile, retrieved_at)];
            Ok((1, rows))
        }
        RetrievalPlan::Following => {
            let following = client.fetch_all_following(&account.id).await?;
            store.write_run(&meta, &following)?;
            let rows = following
                .iter()
                .map(|followed| flatten::following_row(account, followed, retrieved_at))
                .collect();
            Ok((following.len(), rows))
        }
        RetrievalPlan::Reposted => {
            let reposted = client.fetch_all_reposted(&account.id).await?;
            store.write_run(&meta, &reposted)?;
            let rows = reposted
                .iter()
                .map(|video| flatten::video_row(account, video, retrieved_at))
                .collect();
            Ok((reposted.len(), rows))
        }
        RetrievalPlan::Videos { since, until } => {
            let videos = client.fetch_all_videos(&account.id, since, until).await?;
            store.write_run(&meta, &videos)?;
            let rows = videos
                .iter()
                .map(|video| flatten::video_row(account, video, retrieved_at))
                .collect();
            Ok((videos.len(), rows))
        }
    }
}
