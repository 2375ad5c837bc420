use serde::Serialize;

use super::post::Post;

/// Per-post engagement as seen by the signed-in user.
///
/// Derived from a post's liker/bookmarker sets on reseed, then mutated
/// locally by the optimistic toggles. A toggle moves `like_count` by
/// exactly one relative to the previous `is_liked_by_me`; it never
/// recounts the liker set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementState {
    pub is_liked_by_me: bool,
    pub like_count: u32,
    pub is_saved_by_me: bool,
}

impl EngagementState {
    pub fn derive(post: &Post, user_id: &str, is_saved: bool) -> Self {
        Self {
            is_liked_by_me: post.is_liked_by(user_id),
            like_count: post.like_count(),
            is_saved_by_me: is_saved,
        }
    }

    /// Flip the like flag and move the count by one. The count saturates
    /// at zero.
    pub fn toggle_like(&mut self) {
        if self.is_liked_by_me {
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.like_count = self.like_count.saturating_add(1);
        }
        self.is_liked_by_me = !self.is_liked_by_me;
    }

    pub fn toggle_save(&mut self) {
        self.is_saved_by_me = !self.is_saved_by_me;
    }
}
