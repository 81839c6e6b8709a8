//! HTTP client for the TikTok Research API.
//!
//! Wraps `reqwest` with bearer authentication, envelope checking, retry
//! with back-off, and shared request pacing. Every endpoint is a POST whose
//! requested fields travel in the `fields` query parameter and whose
//! arguments travel in the JSON body. All endpoint methods check the
//! `error.code` field of the response envelope and map API-level failures
//! onto [`ResearchError`] variants.

mod fetch_all;
mod videos;

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;

use crate::error::ResearchError;
use crate::pacer::Pacer;
use crate::retry::retry_with_backoff;
use crate::types::{
    ApiEnvelope, ApiErrorBody, FollowedAccount, FollowingData, Page, RepostedData, UserProfile,
    VideoRecord,
};

const DEFAULT_BASE_URL: &str = "https://open.tiktokapis.com";

/// Back-off applied to rate-limit responses that carry no `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

const USER_INFO_PATH: &str = "/v2/research/user/info/";
const FOLLOWING_PATH: &str = "/v2/research/user/following/";
const REPOSTED_PATH: &str = "/v2/research/user/reposted_videos/";
pub(crate) const VIDEO_QUERY_PATH: &str = "/v2/research/video/query/";

/// Field list requested for profile lookups.
pub const PROFILE_FIELDS: &str = "display_name,bio_description,avatar_url,is_verified,\
                                  follower_count,following_count,likes_count,video_count";

/// Field list requested for reposted-video payloads.
pub const VIDEO_FIELDS: &str = "id,create_time,username,region_code,video_description,music_id,\
                                like_count,comment_count,share_count,view_count,hashtag_names,\
                                video_duration,favorites_count,is_stem_verified";

/// Video fields plus the extras only the query endpoint returns.
pub const VIDEO_QUERY_FIELDS: &str = "id,create_time,username,region_code,video_description,\
                                      music_id,like_count,comment_count,share_count,view_count,\
                                      hashtag_names,video_duration,favorites_count,\
                                      is_stem_verified,voice_to_text,playlist_id,effect_ids";

/// Connection and pagination settings for [`ResearchClient`].
pub struct ResearchClientConfig {
    /// Bearer token for the Research API.
    pub access_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Additional attempts after a failed request.
    pub max_retries: u32,
    /// Base delay for exponential back-off, in milliseconds.
    pub backoff_base_ms: u64,
    /// Minimum spacing between successive requests, in milliseconds.
    pub min_request_interval_ms: u64,
    /// Upper bound on pages fetched per account and retrieval.
    pub max_pages: usize,
    /// Records requested per page, capped by the API at 100.
    pub page_size: u32,
}

impl fmt::Debug for ResearchClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchClientConfig")
            .field("access_token", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("min_request_interval_ms", &self.min_request_interval_ms)
            .field("max_pages", &self.max_pages)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Client for the TikTok Research API.
///
/// Use [`ResearchClient::new`] for production or
/// [`ResearchClient::with_base_url`] to point at a mock server in tests.
/// The client is cheap to share behind an `Arc`; the pacer inside it
/// serializes requests across however many tasks hold it.
pub struct ResearchClient {
    http: reqwest::Client,
    base_url: String,
    config: ResearchClientConfig,
    pacer: Pacer,
}

impl ResearchClient {
    /// Creates a client pointed at the production Research API.
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: ResearchClientConfig) -> Result<Self, ResearchError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ResearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        config: ResearchClientConfig,
        base_url: &str,
    ) -> Result<Self, ResearchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("poltok/0.1 (research-collection)")
            .build()?;
        let pacer = Pacer::new(Duration::from_millis(config.min_request_interval_ms));

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            config,
            pacer,
        })
    }

    /// Fetches the public profile for `username`.
    ///
    /// # Errors
    ///
    /// - [`ResearchError::NotFound`] if the account does not exist.
    /// - [`ResearchError::Auth`] if the token is rejected.
    /// - [`ResearchError::RateLimited`] once retries are exhausted.
    /// - [`ResearchError::Http`] / [`ResearchError::Deserialize`] on
    ///   transport or shape failures.
    pub async fn fetch_user_info(&self, username: &str) -> Result<UserProfile, ResearchError> {
        let body = UserInfoRequest { username };
        self.post_api(USER_INFO_PATH, Some(PROFILE_FIELDS), username, &body)
            .await
    }

    /// Fetches one page of accounts that `username` follows.
    ///
    /// Pass `cursor: None` for the first page, then the `next_cursor` of
    /// each returned page until it comes back `None`.
    ///
    /// # Errors
    ///
    /// Same classification as [`ResearchClient::fetch_user_info`].
    pub async fn fetch_following_page(
        &self,
        username: &str,
        cursor: Option<i64>,
    ) -> Result<Page<FollowedAccount>, ResearchError> {
        let body = PagedRequest {
            username,
            max_count: self.config.page_size,
            cursor,
        };
        let data: FollowingData = self.post_api(FOLLOWING_PATH, None, username, &body).await?;
        Ok(Page {
            records: data.user_following,
            next_cursor: next_cursor(data.has_more, data.cursor),
        })
    }

    /// Fetches one page of videos that `username` has reposted.
    ///
    /// # Errors
    ///
    /// Same classification as [`ResearchClient::fetch_user_info`].
    pub async fn fetch_reposted_page(
        &self,
        username: &str,
        cursor: Option<i64>,
    ) -> Result<Page<VideoRecord>, ResearchError> {
        let body = PagedRequest {
            username,
            max_count: self.config.page_size,
            cursor,
        };
        let data: RepostedData = self
            .post_api(REPOSTED_PATH, Some(VIDEO_FIELDS), username, &body)
            .await?;
        Ok(Page {
            records: data.reposted_videos,
            next_cursor: next_cursor(data.has_more, data.cursor),
        })
    }

    /// Sends one POST, with pacing and retry, and parses the envelope.
    async fn post_api<B, T>(
        &self,
        path: &str,
        fields: Option<&str>,
        username: &str,
        body: &B,
    ) -> Result<T, ResearchError>
    where
        B: Serialize,
        T: DeserializeOwned + Default,
    {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        retry_with_backoff(self.config.max_retries, self.config.backoff_base_ms, || {
            async move {
                self.pacer.wait().await;
                let mut request = self
                    .http
                    .post(url)
                    .bearer_auth(&self.config.access_token);
                if let Some(fields) = fields {
                    request = request.query(&[("fields", fields)]);
                }
                let response = request.json(body).send().await?;
                self.handle_response(response, url, username).await
            }
        })
        .await
    }

    /// Maps the HTTP status, then the envelope error code, onto
    /// [`ResearchError`]; returns the payload on success.
    async fn handle_response<T: DeserializeOwned + Default>(
        &self,
        response: reqwest::Response,
        url: &str,
        username: &str,
    ) -> Result<T, ResearchError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(ResearchError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let message = response.text().await.unwrap_or_default();
            return Err(ResearchError::Auth {
                status: status.as_u16(),
                message,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ResearchError::NotFound {
                username: username.to_owned(),
            });
        }
        if status.is_server_error() {
            return Err(ResearchError::ServerError {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(ResearchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|source| ResearchError::Deserialize {
                context: url.to_owned(),
                source,
            })?;
        if !envelope.error.is_ok() {
            return Err(classify_api_error(status, username, &envelope.error));
        }
        envelope.data.ok_or_else(|| ResearchError::Deserialize {
            context: url.to_owned(),
            source: serde_json::Error::custom("success envelope carried no data object"),
        })
    }
}

/// Maps an envelope error code onto the matching [`ResearchError`].
///
/// Requests are machine-built, so `invalid_params` in practice means the
/// username was not accepted.
fn classify_api_error(status: StatusCode, username: &str, error: &ApiErrorBody) -> ResearchError {
    match error.code.as_str() {
        "access_token_invalid" | "scope_not_authorized" | "scope_permission_missed" => {
            ResearchError::Auth {
                status: status.as_u16(),
                message: error.message.clone(),
            }
        }
        "rate_limit_exceeded" | "daily_quota_limit_exceeded" => ResearchError::RateLimited {
            retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
        },
        "invalid_params" => ResearchError::NotFound {
            username: username.to_owned(),
        },
        _ => ResearchError::Api {
            code: error.code.clone(),
            message: error.message.clone(),
        },
    }
}

/// Treats `has_more` without a cursor as end-of-data so pagination always
/// terminates.
fn next_cursor(has_more: bool, cursor: Option<i64>) -> Option<i64> {
    if has_more {
        cursor
    } else {
        None
    }
}

#[derive(Debug, Serialize)]
struct UserInfoRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Serialize)]
struct PagedRequest<'a> {
    username: &'a str,
    max_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ResearchClientConfig {
        ResearchClientConfig {
            access_token: "act.test-token".to_owned(),
            timeout_secs: 5,
            max_retries: 0,
            backoff_base_ms: 1,
            min_request_interval_ms: 0,
            max_pages: 10,
            page_size: 100,
        }
    }

    #[test]
    fn with_base_url_strips_trailing_slash() {
        let client = ResearchClient::with_base_url(test_config(), "http://localhost:9100/")
            .expect("client construction should not fail");
        assert_eq!(client.base_url, "http://localhost:9100");
    }

    #[test]
    fn next_cursor_links_only_when_more_pages_exist() {
        assert_eq!(next_cursor(true, Some(42)), Some(42));
        assert_eq!(next_cursor(false, Some(42)), None);
        assert_eq!(
            next_cursor(true, None),
            None,
            "has_more without a cursor must still terminate"
        );
    }

    #[test]
    fn paged_request_omits_an_absent_cursor() {
        let body = serde_json::to_value(PagedRequest {
            username: "partido_azul",
            max_count: 100,
            cursor: None,
        })
        .unwrap();
        assert!(body.get("cursor").is_none());

        let body = serde_json::to_value(PagedRequest {
            username: "partido_azul",
            max_count: 100,
            cursor: Some(9),
        })
        .unwrap();
        assert_eq!(body["cursor"], 9);
    }

    #[test]
    fn classify_maps_token_codes_to_auth() {
        let error = ApiErrorBody {
            code: "access_token_invalid".to_owned(),
            message: "The access token is invalid or not found".to_owned(),
            log_id: String::new(),
        };
        let mapped = classify_api_error(StatusCode::OK, "someone", &error);
        assert!(matches!(mapped, ResearchError::Auth { .. }));
    }

    #[test]
    fn classify_maps_invalid_params_to_not_found() {
        let error = ApiErrorBody {
            code: "invalid_params".to_owned(),
            message: "cannot find the user".to_owned(),
            log_id: String::new(),
        };
        let mapped = classify_api_error(StatusCode::OK, "ghost", &error);
        assert!(matches!(mapped, ResearchError::NotFound { ref username } if username == "ghost"));
    }

    #[test]
    fn debug_redacts_the_access_token() {
        let rendered = format!("{:?}", test_config());
        assert!(rendered.contains("[redacted]"));
        assert!(!rendered.contains("act.test-token"));
    }
}
