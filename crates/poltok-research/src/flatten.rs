//! Flattens API records into one JSON row per record for the processed
//! output files.
//!
//! Every row repeats the registry identity of the account it came from
//! (`account_id`, `account_name`, `category`, `party`) plus the retrieval
//! timestamp, so the processed files stand alone without a join back to
//! the registry.

use chrono::{DateTime, Utc};
use poltok_core::AccountConfig;
use serde_json::{json, Value};

use crate::types::{FollowedAccount, UserProfile, VideoRecord};

/// One processed row for a profile retrieval.
#[must_use]
pub fn profile_row(
    account: &AccountConfig,
    profile: &UserProfile,
    retrieved_at: DateTime<Utc>,
) -> Value {
    json!({
        "account_id": account.id,
        "account_name": account.name,
        "category": account.category.as_str(),
        "party": account.party,
        "retrieved_at": retrieved_at.to_rfc3339(),
        "display_name": profile.display_name,
        "bio_description": profile.bio_description,
        "avatar_url": profile.avatar_url,
        "is_verified": profile.is_verified,
        "follower_count": profile.follower_count,
        "following_count": profile.following_count,
        "likes_count": profile.likes_count,
        "video_count": profile.video_count,
    })
}

/// One processed row for a single followed account.
#[must_use]
pub fn following_row(
    account: &AccountConfig,
    followed: &FollowedAccount,
    retrieved_at: DateTime<Utc>,
) -> Value {
    json!({
        "account_id": account.id,
        "account_name": account.name,
        "category": account.category.as_str(),
        "party": account.party,
        "retrieved_at": retrieved_at.to_rfc3339(),
        "following_username": followed.username,
        "following_display_name": followed.display_name,
    })
}

/// One processed row for a video, shared by the reposted and video-query
/// retrievals. `create_time_utc` is derived from the epoch `create_time`
/// when it is present.
#[must_use]
pub fn video_row(account: &AccountConfig, video: &VideoRecord, retrieved_at: DateTime<Utc>) -> Value {
    let create_time_utc = video
        .create_time
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.to_rfc3339());

    json!({
        "account_id": account.id,
        "account_name": account.name,
        "category": account.category.as_str(),
        "party": account.party,
        "retrieved_at": retrieved_at.to_rfc3339(),
        "video_id": video.id,
        "create_time": video.create_time,
        "create_time_utc": create_time_utc,
        "username": video.username,
        "region_code": video.region_code,
        "video_description": video.video_description,
        "music_id": video.music_id,
        "like_count": video.like_count,
        "comment_count": video.comment_count,
        "share_count": video.share_count,
        "view_count": video.view_count,
        "favorites_count": video.favorites_count,
        "hashtag_names": video.hashtag_names,
        "video_duration": video.video_duration,
        "is_stem_verified": video.is_stem_verified,
        "voice_to_text": video.voice_to_text,
        "playlist_id": video.playlist_id,
        "effect_ids": video.effect_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use poltok_core::Category;

    fn personality() -> AccountConfig {
        AccountConfig {
            id: "ana.ferreira".to_owned(),
            name: "Ana Ferreira".to_owned(),
            category: Category::Personality,
            party: Some("Partido Azul".to_owned()),
        }
    }

    fn party_account() -> AccountConfig {
        AccountConfig {
            id: "partido_azul".to_owned(),
            name: "Partido Azul".to_owned(),
            category: Category::Party,
            party: None,
        }
    }

    fn retrieved_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn profile_row_carries_the_account_identity() {
        let profile = UserProfile {
            display_name: Some("Ana Ferreira".to_owned()),
            follower_count: Some(120_345),
            ..UserProfile::default()
        };
        let row = profile_row(&personality(), &profile, retrieved_at());

        assert_eq!(row["account_id"], "ana.ferreira");
        assert_eq!(row["category"], "personality");
        assert_eq!(row["party"], "Partido Azul");
        assert_eq!(row["follower_count"], 120_345);
        assert_eq!(row["bio_description"], Value::Null);
    }

    #[test]
    fn party_is_null_for_accounts_without_affiliation() {
        let row = profile_row(&party_account(), &UserProfile::default(), retrieved_at());
        assert_eq!(row["category"], "party");
        assert_eq!(row["party"], Value::Null);
    }

    #[test]
    fn following_row_names_both_sides() {
        let followed = FollowedAccount {
            username: "partido_verde".to_owned(),
            display_name: Some("Partido Verde".to_owned()),
        };
        let row = following_row(&party_account(), &followed, retrieved_at());

        assert_eq!(row["account_id"], "partido_azul");
        assert_eq!(row["following_username"], "partido_verde");
        assert_eq!(row["following_display_name"], "Partido Verde");
    }

    #[test]
    fn video_row_derives_the_utc_timestamp() {
        let video = VideoRecord {
            id: 7_438_291,
            create_time: Some(1_700_000_000),
            like_count: Some(12),
            hashtag_names: vec!["eleicoes".to_owned()],
            ..VideoRecord::default()
        };
        let row = video_row(&personality(), &video, retrieved_at());

        assert_eq!(row["video_id"], 7_438_291);
        assert_eq!(row["create_time"], 1_700_000_000i64);
        assert_eq!(row["create_time_utc"], "2023-11-14T22:13:20+00:00");
        assert_eq!(row["hashtag_names"][0], "eleicoes");
    }

    #[test]
    fn video_row_leaves_the_utc_timestamp_null_when_absent() {
        let video = VideoRecord {
            id: 1,
            ..VideoRecord::default()
        };
        let row = video_row(&personality(), &video, retrieved_at());
        assert_eq!(row["create_time_utc"], Value::Null);
    }
}
