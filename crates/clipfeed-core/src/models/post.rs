use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::User;

/// Denormalized reference to the user who created a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub avatar: String,
}

impl From<&User> for Creator {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// A video post as stored by the remote document store.
///
/// Server-owned: ids and timestamps are assigned by the gateway, never
/// invented on the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub prompt: String,
    /// Thumbnail image URI
    pub thumbnail: String,
    /// Video URI
    pub video: String,
    pub creator: Creator,
    pub created_at: DateTime<Utc>,
    /// User ids that liked this post
    #[serde(default)]
    pub likers: BTreeSet<String>,
    /// User ids that bookmarked this post
    #[serde(default)]
    pub bookmarkers: BTreeSet<String>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likers.contains(user_id)
    }

    pub fn is_bookmarked_by(&self, user_id: &str) -> bool {
        self.bookmarkers.contains(user_id)
    }

    pub fn like_count(&self) -> u32 {
        u32::try_from(self.likers.len()).unwrap_or(u32::MAX)
    }

    pub fn is_created_by(&self, user_id: &str) -> bool {
        self.creator.id == user_id
    }
}
