//! Builders shared by the unit tests.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Creator, Post, User};

/// 2024-06-01T00:00:00Z
const BASE_TIMESTAMP: i64 = 1_717_200_000;

pub fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("user {}", id),
        email: format!("{}@example.com", id),
        avatar: format!("avatar://{}", id),
        bio: None,
    }
}

/// A post by `creator_id`, `minute` minutes after a fixed base time. Higher
/// minutes sort newer.
pub fn post(id: &str, creator_id: &str, minute: i64) -> Post {
    let base = DateTime::<Utc>::from_timestamp(BASE_TIMESTAMP, 0).unwrap_or_default();
    Post {
        id: id.to_string(),
        title: format!("Post {}", minute),
        prompt: format!("prompt for {}", id),
        thumbnail: format!("memory://storage/files/thumb-{}/view", id),
        video: format!("memory://storage/files/video-{}/view", id),
        creator: Creator::from(&user(creator_id)),
        created_at: base + Duration::minutes(minute),
        likers: BTreeSet::new(),
        bookmarkers: BTreeSet::new(),
    }
}
