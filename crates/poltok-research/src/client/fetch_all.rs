//! Cursor-driven pagination over the per-user list endpoints.
//!
//! Each `fetch_all_*` method walks pages until the server reports no more
//! data, collecting every record in API order. The walk is all-or-nothing:
//! a failed page fails the whole retrieval so a partial result is never
//! mistaken for a complete one.

use tracing::debug;

use crate::client::ResearchClient;
use crate::error::ResearchError;
use crate::types::{FollowedAccount, VideoRecord};

impl ResearchClient {
    /// Fetches the complete following list for `username`.
    ///
    /// # Errors
    ///
    /// Propagates the first page-level error, or
    /// [`ResearchError::PaginationLimit`] when the server keeps reporting
    /// more pages past the configured bound.
    pub async fn fetch_all_following(
        &self,
        username: &str,
    ) -> Result<Vec<FollowedAccount>, ResearchError> {
        let mut records = Vec::new();
        let mut cursor = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > self.config.max_pages {
                return Err(ResearchError::PaginationLimit {
                    username: username.to_owned(),
                    max_pages: self.config.max_pages,
                });
            }

            let page = self.fetch_following_page(username, cursor).await?;
            debug!(
                username,
                page = page_count,
                records = page.records.len(),
                "fetched following page"
            );
            records.extend(page.records);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }

    /// Fetches the complete reposted-videos list for `username`.
    ///
    /// # Errors
    ///
    /// Same behavior as [`ResearchClient::fetch_all_following`].
    pub async fn fetch_all_reposted(
        &self,
        username: &str,
    ) -> Result<Vec<VideoRecord>, ResearchError> {
        let mut records = Vec::new();
        let mut cursor = None;
        let mut page_count = 0usize;

        loop {
            page_count += 1;
            if page_count > self.config.max_pages {
                return Err(ResearchError::PaginationLimit {
                    username: username.to_owned(),
                    max_pages: self.config.max_pages,
                });
            }

            let page = self.fetch_reposted_page(username, cursor).await?;
            debug!(
                username,
                page = page_count,
                records = page.records.len(),
                "fetched reposted page"
            );
            records.extend(page.records);

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(records)
    }
}
