//! Wire types for the TikTok Research API.
//!
//! Every endpoint wraps its payload in the same envelope: a `data` object
//! plus an `error` object whose `code` field is `"ok"` on success. Paginated
//! payloads carry an integer `cursor` and a `has_more` flag; the list field
//! name differs per endpoint. All payload fields are optional on the wire,
//! so records deserialize even when the API omits fields we asked for.

use serde::{Deserialize, Serialize};

/// Response envelope shared by every Research API endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub data: Option<T>,
    pub error: ApiErrorBody,
}

/// The `error` object present on every response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub log_id: String,
}

impl ApiErrorBody {
    /// The API signals success with the literal code `"ok"`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.code == "ok"
    }
}

/// Public profile fields returned by `research/user/info/`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio_description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: Option<bool>,
    #[serde(default)]
    pub follower_count: Option<i64>,
    #[serde(default)]
    pub following_count: Option<i64>,
    #[serde(default)]
    pub likes_count: Option<i64>,
    #[serde(default)]
    pub video_count: Option<i64>,
}

/// One entry in a `research/user/following/` page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FollowedAccount {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A video as returned by the reposted-videos and video-query endpoints.
///
/// `voice_to_text`, `playlist_id`, and `effect_ids` only come back from the
/// query endpoint; they deserialize to empty defaults elsewhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoRecord {
    pub id: i64,
    #[serde(default)]
    pub create_time: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub region_code: Option<String>,
    #[serde(default)]
    pub video_description: Option<String>,
    #[serde(default)]
    pub music_id: Option<i64>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub share_count: Option<i64>,
    #[serde(default)]
    pub view_count: Option<i64>,
    #[serde(default)]
    pub favorites_count: Option<i64>,
    #[serde(default)]
    pub hashtag_names: Vec<String>,
    #[serde(default)]
    pub video_duration: Option<i64>,
    #[serde(default)]
    pub is_stem_verified: Option<bool>,
    #[serde(default)]
    pub voice_to_text: Option<String>,
    #[serde(default)]
    pub playlist_id: Option<i64>,
    #[serde(default)]
    pub effect_ids: Vec<String>,
}

/// Payload of a `research/user/following/` page.
#[derive(Debug, Default, Deserialize)]
pub struct FollowingData {
    #[serde(default)]
    pub user_following: Vec<FollowedAccount>,
    #[serde(default)]
    pub cursor: Option<i64>,
    #[serde(default)]
    pub has_more: bool,
}

/// Payload of a `research/user/reposted_videos/` page.
///
/// The API has shipped this list under two names; the alias accepts both.
#[derive(Debug, Default, Deserialize)]
pub struct RepostedData {
    #[serde(default, alias = "user_reposted_videos")]
    pub reposted_videos: Vec<VideoRecord>,
    #[serde(default)]
    pub cursor: Option<i64>,
    #[serde(default)]
    pub has_more: bool,
}

/// Payload of a `research/video/query/` page.
#[derive(Debug, Default, Deserialize)]
pub struct VideoQueryData {
    #[serde(default)]
    pub videos: Vec<VideoRecord>,
    #[serde(default)]
    pub cursor: Option<i64>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub search_id: Option<String>,
}

/// One page of records plus the cursor for the next page, if any.
#[derive(Debug)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub next_cursor: Option<i64>,
}

/// One page of video-query results. `search_id` must be echoed on the next
/// request of the same query so the server continues the same result set.
#[derive(Debug)]
pub struct VideoQueryPage {
    pub records: Vec<VideoRecord>,
    pub next_cursor: Option<i64>,
    pub search_id: Option<String>,
}
