//! Date-windowed queries against the video search endpoint.
//!
//! The query endpoint caps `start_date`..`end_date` at 30 days, so longer
//! ranges are walked as consecutive windows. Within a window the server
//! issues a `search_id` on the first page that must be echoed on the rest.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::client::{ResearchClient, VIDEO_QUERY_FIELDS, VIDEO_QUERY_PATH};
use crate::error::ResearchError;
use crate::types::{VideoQueryData, VideoQueryPage, VideoRecord};

/// The API rejects query windows longer than 30 days.
const MAX_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Serialize)]
struct VideoQueryRequest<'a> {
    query: VideoQuery<'a>,
    start_date: String,
    end_date: String,
    max_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VideoQuery<'a> {
    and: Vec<QueryCondition<'a>>,
}

#[derive(Debug, Serialize)]
struct QueryCondition<'a> {
    operation: &'a str,
    field_name: &'a str,
    field_values: Vec<&'a str>,
}

fn username_query(username: &str) -> VideoQuery<'_> {
    VideoQuery {
        and: vec![QueryCondition {
            operation: "EQ",
            field_name: "username",
            field_values: vec![username],
        }],
    }
}

/// Splits an inclusive date range into consecutive windows of at most
/// [`MAX_WINDOW_DAYS`] days each. Empty when `since > until`.
fn date_windows(since: NaiveDate, until: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut start = since;
    while start <= until {
        let end = (start + Days::new(MAX_WINDOW_DAYS - 1)).min(until);
        windows.push((start, end));
        start = end + Days::new(1);
    }
    windows
}

impl ResearchClient {
    /// Fetches one page of videos posted by `username` inside the window.
    ///
    /// `search_id` must be `None` on the first page of a window and the
    /// server-issued value on every later page.
    ///
    /// # Errors
    ///
    /// Same classification as [`ResearchClient::fetch_user_info`].
    pub async fn query_videos_page(
        &self,
        username: &str,
        start: NaiveDate,
        end: NaiveDate,
        cursor: Option<i64>,
        search_id: Option<&str>,
    ) -> Result<VideoQueryPage, ResearchError> {
        let body = VideoQueryRequest {
            query: username_query(username),
            start_date: start.format("%Y%m%d").to_string(),
            end_date: end.format("%Y%m%d").to_string(),
            max_count: self.config.page_size,
            cursor,
            search_id,
        };
        let data: VideoQueryData = self
            .post_api(VIDEO_QUERY_PATH, Some(VIDEO_QUERY_FIELDS), username, &body)
            .await?;
        Ok(VideoQueryPage {
            records: data.videos,
            next_cursor: super::next_cursor(data.has_more, data.cursor),
            search_id: data.search_id,
        })
    }

    /// Fetches every video `username` posted between `since` and `until`
    /// (inclusive), walking the windows oldest first.
    ///
    /// # Errors
    ///
    /// Propagates the first page-level error, or
    /// [`ResearchError::PaginationLimit`] when any single window keeps
    /// reporting more pages past the configured bound.
    pub async fn fetch_all_videos(
        &self,
        username: &str,
        since: NaiveDate,
        until: NaiveDate,
    ) -> Result<Vec<VideoRecord>, ResearchError> {
        let mut records = Vec::new();

        for (start, end) in date_windows(since, until) {
            let mut cursor = None;
            let mut search_id: Option<String> = None;
            let mut page_count = 0usize;

            loop {
                page_count += 1;
                if page_count > self.config.max_pages {
                    return Err(ResearchError::PaginationLimit {
                        username: username.to_owned(),
                        max_pages: self.config.max_pages,
                    });
                }

                let page = self
                    .query_videos_page(username, start, end, cursor, search_id.as_deref())
                    .await?;
                debug!(
                    username,
                    %start,
                    %end,
                    page = page_count,
                    records = page.records.len(),
                    "fetched video query page"
                );
                records.extend(page.records);
                if page.search_id.is_some() {
                    search_id = page.search_id;
                }

                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_range_is_one_window() {
        let windows = date_windows(date(2024, 3, 15), date(2024, 3, 15));
        assert_eq!(windows, vec![(date(2024, 3, 15), date(2024, 3, 15))]);
    }

    #[test]
    fn thirty_day_range_fits_one_window() {
        let windows = date_windows(date(2024, 1, 1), date(2024, 1, 30));
        assert_eq!(windows, vec![(date(2024, 1, 1), date(2024, 1, 30))]);
    }

    #[test]
    fn thirty_one_days_split_into_two_windows() {
        let windows = date_windows(date(2024, 1, 1), date(2024, 1, 31));
        assert_eq!(
            windows,
            vec![
                (date(2024, 1, 1), date(2024, 1, 30)),
                (date(2024, 1, 31), date(2024, 1, 31)),
            ]
        );
    }

    #[test]
    fn windows_are_contiguous_and_cover_the_range() {
        let since = date(2024, 1, 1);
        let until = date(2024, 3, 15);
        let windows = date_windows(since, until);

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].0, since);
        assert_eq!(windows.last().unwrap().1, until);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].1 + Days::new(1), pair[1].0);
        }
    }

    #[test]
    fn inverted_range_yields_no_windows() {
        assert!(date_windows(date(2024, 2, 1), date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn request_body_has_the_expected_shape() {
        let body = serde_json::to_value(VideoQueryRequest {
            query: username_query("ana.ferreira"),
            start_date: "20240101".to_owned(),
            end_date: "20240130".to_owned(),
            max_count: 100,
            cursor: None,
            search_id: None,
        })
        .unwrap();

        assert_eq!(body["query"]["and"][0]["operation"], "EQ");
        assert_eq!(body["query"]["and"][0]["field_name"], "username");
        assert_eq!(body["query"]["and"][0]["field_values"][0], "ana.ferreira");
        assert_eq!(body["start_date"], "20240101");
        assert_eq!(body["max_count"], 100);
        assert!(body.get("cursor").is_none());
        assert!(body.get("search_id").is_none());
    }
}
