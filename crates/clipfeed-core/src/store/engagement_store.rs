use std::collections::{HashMap, HashSet};

use crate::models::{EngagementState, Post};

/// Sub-store for per-post engagement, keyed by post id.
///
/// Rebuilt wholesale from the seed set on reseed; between reseeds only the
/// optimistic toggles (and explicit single-post reconciliation) change it.
#[derive(Debug, Default)]
pub struct EngagementStore {
    entries: HashMap<String, EngagementState>,
}

impl EngagementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    // ===== Derivation =====

    /// Replace every entry with state derived from `seed`. Saved flags come
    /// from membership in `saved_ids`, the user's bookmarked-posts listing.
    pub fn reseed(&mut self, seed: &[Post], user_id: &str, saved_ids: &HashSet<String>) {
        self.entries = seed
            .iter()
            .map(|post| {
                let saved = saved_ids.contains(&post.id);
                (post.id.clone(), EngagementState::derive(post, user_id, saved))
            })
            .collect();
    }

    /// Derive entries for posts that arrived after the last reseed. Existing
    /// entries are left alone.
    pub fn fill_missing(&mut self, posts: &[Post], user_id: &str) -> usize {
        let mut added = 0;
        for post in posts {
            self.entries.entry(post.id.clone()).or_insert_with(|| {
                added += 1;
                EngagementState::derive(post, user_id, post.is_bookmarked_by(user_id))
            });
        }
        added
    }

    /// Re-derive a single post from an authoritative copy.
    pub fn reconcile(&mut self, post: &Post, user_id: &str) {
        self.entries.insert(
            post.id.clone(),
            EngagementState::derive(post, user_id, post.is_bookmarked_by(user_id)),
        );
    }

    // ===== Access =====

    pub fn get(&self, id: &str) -> Option<EngagementState> {
        self.entries.get(id).copied()
    }

    /// Entry for a post the caller knows is rendered.
    ///
    /// Panics if `id` is unknown: screens only act on posts they display,
    /// so a miss is a bug in the caller.
    pub fn expect_mut(&mut self, id: &str) -> &mut EngagementState {
        match self.entries.get_mut(id) {
            Some(state) => state,
            None => panic!("engagement requested for unknown post id {:?}", id),
        }
    }

    /// Put `previous` back only if the entry still holds `expected`.
    pub fn restore_if(
        &mut self,
        id: &str,
        expected: EngagementState,
        previous: EngagementState,
    ) -> bool {
        match self.entries.get_mut(id) {
            Some(state) if *state == expected => {
                *state = previous;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::post;

    fn seed() -> Vec<Post> {
        let mut a = post("a", "u2", 2);
        a.likers = ["u1", "u3"].iter().map(|s| s.to_string()).collect();
        let mut b = post("b", "u2", 1);
        b.likers = ["u3"].iter().map(|s| s.to_string()).collect();
        vec![a, b]
    }

    #[test]
    fn test_reseed_derives_flags_and_counts() {
        let mut store = EngagementStore::new();
        let saved: HashSet<String> = ["b".to_string()].into_iter().collect();
        store.reseed(&seed(), "u1", &saved);

        let a = store.get("a").unwrap();
        assert!(a.is_liked_by_me);
        assert_eq!(a.like_count, 2);
        assert!(!a.is_saved_by_me);

        let b = store.get("b").unwrap();
        assert!(!b.is_liked_by_me);
        assert_eq!(b.like_count, 1);
        assert!(b.is_saved_by_me);
    }

    #[test]
    fn test_fill_missing_keeps_existing_entries() {
        let mut store = EngagementStore::new();
        store.reseed(&seed(), "u1", &HashSet::new());
        store.expect_mut("a").toggle_like();

        let added = store.fill_missing(&[seed()[0].clone(), post("c", "u2", 3)], "u1");
        assert_eq!(added, 1);
        // "a" keeps its local toggle
        assert!(!store.get("a").unwrap().is_liked_by_me);
        assert_eq!(store.get("c").unwrap().like_count, 0);
    }

    #[test]
    fn test_restore_if_is_compare_and_swap() {
        let mut store = EngagementStore::new();
        store.reseed(&seed(), "u1", &HashSet::new());
        let previous = store.get("b").unwrap();
        store.expect_mut("b").toggle_like();
        let optimistic = store.get("b").unwrap();

        // Someone toggled again in between: leave it
        store.expect_mut("b").toggle_save();
        assert!(!store.restore_if("b", optimistic, previous));

        store.expect_mut("b").toggle_save();
        assert!(store.restore_if("b", optimistic, previous));
        assert_eq!(store.get("b"), Some(previous));
    }

    #[test]
    #[should_panic(expected = "unknown post id")]
    fn test_unknown_id_panics() {
        let mut store = EngagementStore::new();
        store.expect_mut("missing");
    }
}
