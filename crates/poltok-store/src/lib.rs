//! Filesystem store for raw and processed collection output.
//!
//! Layout under the configured root:
//!
//! ```text
//! raw/<retrieval>/<YYYY-MM-DD>/<account_id>.json
//! processed/<retrieval>/<category>.ndjson
//! ```
//!
//! Every write lands in a `.tmp` sibling first and is moved into place
//! with `rename`, so a crash mid-write never leaves a truncated file at
//! the final path. Paths are stable per day and account, and re-running a
//! collection overwrites them wholesale rather than merging.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use poltok_core::{AccountConfig, Category, Retrieval};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Errors produced while writing output files.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize output for {path}: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Identity of one per-account collection run, embedded in the raw output
/// so each file describes itself without a join back to the registry.
#[derive(Debug, Clone, Copy)]
pub struct RunMeta<'a> {
    pub account: &'a AccountConfig,
    pub retrieval: Retrieval,
    pub run_id: Uuid,
    pub retrieved_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct RawDocument<'a, T> {
    account: AccountIdentity<'a>,
    retrieval: &'a str,
    run_id: Uuid,
    retrieved_at: DateTime<Utc>,
    record_count: usize,
    records: &'a [T],
}

#[derive(Serialize)]
struct AccountIdentity<'a> {
    id: &'a str,
    name: &'a str,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    party: Option<&'a str>,
}

/// Store rooted at a single output directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileStore { root: root.into() }
    }

    /// Path of the raw document for one account and retrieval, dated by
    /// the day of `retrieved_at`.
    #[must_use]
    pub fn raw_path(
        &self,
        retrieval: Retrieval,
        retrieved_at: DateTime<Utc>,
        account_id: &str,
    ) -> PathBuf {
        self.root
            .join("raw")
            .join(retrieval.as_str())
            .join(retrieved_at.format("%Y-%m-%d").to_string())
            .join(format!("{account_id}.json"))
    }

    /// Path of the processed NDJSON file for one retrieval and category.
    #[must_use]
    pub fn processed_path(&self, retrieval: Retrieval, category: Category) -> PathBuf {
        self.root
            .join("processed")
            .join(retrieval.as_str())
            .join(format!("{}.ndjson", category.as_str()))
    }

    /// Writes the raw document for one account run and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the directory cannot be created, the
    /// records fail to serialize, or the write or rename fails.
    pub fn write_run<T: Serialize>(
        &self,
        meta: &RunMeta<'_>,
        records: &[T],
    ) -> Result<PathBuf, StoreError> {
        let path = self.raw_path(meta.retrieval, meta.retrieved_at, &meta.account.id);
        let document = RawDocument {
            account: AccountIdentity {
                id: &meta.account.id,
                name: &meta.account.name,
                category: meta.account.category.as_str(),
                party: meta.account.party.as_deref(),
            },
            retrieval: meta.retrieval.as_str(),
            run_id: meta.run_id,
            retrieved_at: meta.retrieved_at,
            record_count: records.len(),
            records,
        };
        let bytes =
            serde_json::to_vec_pretty(&document).map_err(|source| StoreError::Serialize {
                path: path.display().to_string(),
                source,
            })?;
        self.write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Writes one processed NDJSON file, one row per line, and returns its
    /// path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the directory cannot be created, a row
    /// fails to serialize, or the write or rename fails.
    pub fn write_processed(
        &self,
        retrieval: Retrieval,
        category: Category,
        rows: &[serde_json::Value],
    ) -> Result<PathBuf, StoreError> {
        let path = self.processed_path(retrieval, category);
        let mut buf = Vec::with_capacity(rows.len() * 256);
        for row in rows {
            serde_json::to_writer(&mut buf, row).map_err(|source| StoreError::Serialize {
                path: path.display().to_string(),
                source,
            })?;
            buf.push(b'\n');
        }
        self.write_atomic(&path, &buf)?;
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let tmp = tmp_path(path);
        fs::write(&tmp, bytes).map_err(|source| StoreError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

/// `.tmp` sibling in the same directory, so the final `rename` stays on
/// one filesystem.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
