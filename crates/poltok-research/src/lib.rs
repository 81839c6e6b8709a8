//! TikTok Research API client for the poltok collection pipeline.
//!
//! [`ResearchClient`] wraps the per-user endpoints (profile, following,
//! reposted videos) and the date-windowed video query, with retry,
//! back-off, and shared request pacing built in. [`flatten`] turns the
//! returned records into processed output rows.

pub mod client;
pub mod error;
pub mod flatten;
mod pacer;
mod retry;
pub mod types;

pub use client::{
    ResearchClient, ResearchClientConfig, PROFILE_FIELDS, VIDEO_FIELDS, VIDEO_QUERY_FIELDS,
};
pub use error::ResearchError;
pub use types::{FollowedAccount, Page, UserProfile, VideoQueryPage, VideoRecord};
