use std::collections::HashSet;

use serde::Serialize;

use super::pagination::PaginationState;
use crate::models::Post;

/// The feeds owned by the feed cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeedKind {
    /// Every post, newest first, paginated
    Home,
    /// The signed-in user's own posts, fetched in full
    Profile,
    /// Posts the signed-in user bookmarked, fetched in full
    Saved,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Home, FeedKind::Profile, FeedKind::Saved];
}

/// What a screen renders for one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub items: Vec<Post>,
    pub is_loading: bool,
    pub has_more: bool,
}

/// One feed's page list plus its single-flight bookkeeping.
///
/// Every fetch is issued a token. Only the fetch holding the feed's current
/// token may apply its result; a newer fetch for the same feed makes any
/// older one stale.
#[derive(Debug, Clone)]
pub struct Feed {
    pub items: Vec<Post>,
    pub pagination: Option<PaginationState>,
    in_flight: Option<u64>,
}

impl Feed {
    pub fn unpaged() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            in_flight: None,
        }
    }

    pub fn paged(limit: usize) -> Self {
        Self {
            pagination: Some(PaginationState::new(limit)),
            ..Self::unpaged()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Unpaged feeds always hold the complete result.
    pub fn has_more(&self) -> bool {
        self.pagination.map(|p| p.has_more).unwrap_or(false)
    }

    pub fn begin(&mut self, token: u64) {
        self.in_flight = Some(token);
    }

    pub fn is_current(&self, token: u64) -> bool {
        self.in_flight == Some(token)
    }

    /// Release the in-flight slot if `token` still holds it.
    pub fn finish(&mut self, token: u64) -> bool {
        if self.is_current(token) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    /// Drop items and rewind pagination, cancelling nothing.
    pub fn reset(&mut self) {
        self.items.clear();
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.reset();
        }
    }

    pub fn clear(&mut self) {
        self.reset();
        self.in_flight = None;
    }

    /// Append a page, skipping posts already present. Returns how many
    /// duplicates were dropped.
    pub fn append_page(&mut self, page: Vec<Post>) -> usize {
        let mut seen: HashSet<String> = self.items.iter().map(|p| p.id.clone()).collect();
        let offered = page.len();
        let before = self.items.len();
        self.items
            .extend(page.into_iter().filter(|p| seen.insert(p.id.clone())));
        offered - (self.items.len() - before)
    }

    /// Reset, then take `items` as the first page. Returns how many
    /// duplicates were dropped.
    pub fn replace(&mut self, items: Vec<Post>) -> usize {
        self.reset();
        self.append_page(items)
    }

    /// Swap in a fresher copy of a post wherever it appears.
    pub fn patch_post(&mut self, post: &Post) {
        for item in self.items.iter_mut().filter(|p| p.id == post.id) {
            *item = post.clone();
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            is_loading: self.is_loading(),
            has_more: self.has_more(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::post;

    fn ids(feed: &Feed) -> Vec<&str> {
        feed.items.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_append_page_skips_duplicates() {
        let mut feed = Feed::paged(3);
        assert_eq!(feed.append_page(vec![post("a", "u1", 3), post("b", "u1", 2)]), 0);
        assert_eq!(feed.append_page(vec![post("b", "u1", 2), post("c", "u1", 1)]), 1);
        assert_eq!(ids(&feed), ["a", "b", "c"]);
    }

    #[test]
    fn test_tokens_are_single_flight() {
        let mut feed = Feed::unpaged();
        feed.begin(1);
        assert!(feed.is_loading());

        // A newer fetch supersedes the first one
        feed.begin(2);
        assert!(!feed.finish(1));
        assert!(feed.is_loading());
        assert!(feed.finish(2));
        assert!(!feed.is_loading());
    }

    #[test]
    fn test_unpaged_feed_has_no_more() {
        let mut feed = Feed::unpaged();
        feed.replace(vec![post("a", "u1", 1)]);
        let snapshot = feed.snapshot();
        assert!(!snapshot.has_more);
        assert_eq!(snapshot.items.len(), 1);
        assert!(Feed::paged(5).has_more());
    }

    #[test]
    fn test_patch_post_replaces_in_place() {
        let mut feed = Feed::unpaged();
        feed.replace(vec![post("a", "u1", 2), post("b", "u1", 1)]);
        let mut fresh = post("b", "u1", 1);
        fresh.likers.insert("u2".to_string());
        feed.patch_post(&fresh);
        assert_eq!(feed.items[1].like_count(), 1);
        assert_eq!(ids(&feed), ["a", "b"]);
    }
}
