//! Canonical in-memory view of posts shared by every screen.
//!
//! # Initialization order
//! 1. Session resolves to a user (nothing runs before that).
//! 2. Seed: the full unpaged listing plus the user's bookmarked listing
//!    derive engagement state for every known post.
//! 3. Pages: home page 0, the full profile feed and the full saved feed load
//!    concurrently.
//!
//! # Concurrency
//! All methods take `&self` and may be interleaved on one event loop. The
//! state lock is never held across a gateway call. Each feed is
//! single-flight: a refresh supersedes an in-flight fetch, whose result is
//! then discarded, while `load_next_page` is a no-op while anything is in
//! flight for the home feed.
//!
//! Two like toggles on the same post issued before either resolves both
//! compute their write from whatever the server held when they read it, so
//! the final liker set is not guaranteed to match the local state. This is
//! a known race; only a reseed repairs it.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use super::engagement_store::EngagementStore;
use super::feeds::{Feed, FeedKind, FeedSnapshot};
use super::pagination::PaginationState;
use crate::config::{FeedConfig, MutationPolicy};
use crate::constants::messages;
use crate::error::CoreError;
use crate::gateway::{toggled_membership, GatewayError, ListQuery, PostGateway};
use crate::models::{EngagementState, Notification, NotificationSlot, Post, PostForm};
use crate::search::SearchQuery;
use crate::session::Session;

/// How a successful fetch lands in its feed.
#[derive(Debug, Clone, Copy)]
enum Apply {
    Replace,
    Append,
}

struct CacheState {
    /// Unpaged listing the engagement state was derived from
    seed: Vec<Post>,
    seed_in_flight: Option<u64>,
    engagement: EngagementStore,
    home: Feed,
    profile: Feed,
    saved: Feed,
    notification: NotificationSlot,
    next_token: u64,
}

impl CacheState {
    fn new(page_size: usize) -> Self {
        Self {
            seed: Vec::new(),
            seed_in_flight: None,
            engagement: EngagementStore::new(),
            home: Feed::paged(page_size),
            profile: Feed::unpaged(),
            saved: Feed::unpaged(),
            notification: NotificationSlot::default(),
            next_token: 0,
        }
    }

    fn feed(&self, kind: FeedKind) -> &Feed {
        match kind {
            FeedKind::Home => &self.home,
            FeedKind::Profile => &self.profile,
            FeedKind::Saved => &self.saved,
        }
    }

    fn feed_mut(&mut self, kind: FeedKind) -> &mut Feed {
        match kind {
            FeedKind::Home => &mut self.home,
            FeedKind::Profile => &mut self.profile,
            FeedKind::Saved => &mut self.saved,
        }
    }

    fn issue_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Swap a fresher copy of `post` into the seed and every feed.
    fn patch_post(&mut self, post: &Post) {
        for seeded in self.seed.iter_mut().filter(|p| p.id == post.id) {
            *seeded = post.clone();
        }
        for kind in FeedKind::ALL {
            self.feed_mut(kind).patch_post(post);
        }
    }

    /// Forget everything. Tokens keep counting so results of fetches that
    /// were in flight can never be applied.
    fn clear(&mut self) {
        self.seed.clear();
        self.seed_in_flight = None;
        self.engagement.clear();
        for kind in FeedKind::ALL {
            self.feed_mut(kind).clear();
        }
        self.notification.dismiss();
    }
}

pub struct FeedCache {
    gateway: Arc<dyn PostGateway>,
    session: Session,
    config: FeedConfig,
    state: Mutex<CacheState>,
    /// Revision counter bumped on every state change
    changes: watch::Sender<u64>,
}

impl FeedCache {
    pub fn new(gateway: Arc<dyn PostGateway>, session: Session, config: FeedConfig) -> Self {
        let (changes, _) = watch::channel(0);
        let page_size = config.effective_page_size();
        Self {
            gateway,
            session,
            config,
            state: Mutex::new(CacheState::new(page_size)),
            changes,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Receiver that changes whenever any feed, engagement entry or the
    /// notification changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|revision| *revision = revision.wrapping_add(1));
    }

    fn show(&self, notification: Notification) {
        self.state.lock().notification.show(notification);
        self.notify_changed();
    }

    // ===== Initialization =====

    /// Resolve the session if needed, then run a full reseed.
    pub async fn initialize(&self) -> Result<(), CoreError> {
        if !self.session.is_signed_in() {
            self.session.resolve().await;
        }
        self.session.require_user()?;
        self.reseed().await
    }

    /// Re-derive all engagement state from a fresh seed, then reload every
    /// owned feed from its first page. The only operation that repairs
    /// engagement state.
    pub async fn reseed(&self) -> Result<(), CoreError> {
        self.seed_engagement().await?;
        self.reload_all().await
    }

    async fn seed_engagement(&self) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let token = {
            let mut state = self.state.lock();
            let token = state.issue_token();
            state.seed_in_flight = Some(token);
            token
        };

        let result = async {
            let seed = self.gateway.list_all_posts().await?;
            let saved = self.gateway.list_posts_bookmarked_by(&user.id).await?;
            Ok::<_, GatewayError>((seed, saved))
        }
        .await;

        let mut state = self.state.lock();
        if state.seed_in_flight != Some(token) {
            tracing::debug!(token, "discarding stale seed result");
            return Ok(());
        }
        state.seed_in_flight = None;

        let outcome = match result {
            Ok((seed, saved)) => {
                let saved_ids: HashSet<String> = saved.into_iter().map(|p| p.id).collect();
                state.engagement.reseed(&seed, &user.id, &saved_ids);
                state.seed = seed;
                tracing::info!(
                    posts = state.seed.len(),
                    saved = saved_ids.len(),
                    "engagement seeded"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "seed fetch failed");
                state.notification.show(Notification::error(err.message()));
                Err(err.into())
            }
        };
        drop(state);
        self.notify_changed();
        outcome
    }

    /// Home page 0, the profile feed and the saved feed, concurrently.
    pub async fn reload_all(&self) -> Result<(), CoreError> {
        let (home, profile, saved) = tokio::join!(
            self.reset_and_load_first_page(),
            self.fetch_full(FeedKind::Profile),
            self.fetch_full(FeedKind::Saved),
        );
        home.and(profile).and(saved)
    }

    // ===== Fetching =====

    /// Apply a fetch result if `token` still owns the feed.
    async fn run_fetch<F>(
        &self,
        kind: FeedKind,
        token: u64,
        user_id: &str,
        request: F,
        apply: Apply,
    ) -> Result<(), CoreError>
    where
        F: Future<Output = Result<Vec<Post>, GatewayError>>,
    {
        let result = request.await;

        let mut state = self.state.lock();
        if !state.feed_mut(kind).finish(token) {
            tracing::debug!(feed = ?kind, token, "discarding stale fetch result");
            return Ok(());
        }

        let outcome = match result {
            Ok(posts) => {
                let added = state.engagement.fill_missing(&posts, user_id);
                if added > 0 {
                    tracing::debug!(feed = ?kind, added, "derived engagement for unseeded posts");
                }

                let returned = posts.len();
                let feed = state.feed_mut(kind);
                let dropped = match apply {
                    Apply::Replace => feed.replace(posts),
                    Apply::Append => feed.append_page(posts),
                };
                if let Some(pagination) = feed.pagination.as_mut() {
                    pagination.record_page(returned);
                }
                if dropped > 0 {
                    tracing::warn!(feed = ?kind, dropped, "dropped duplicate posts from page");
                }
                tracing::debug!(feed = ?kind, returned, total = feed.items.len(), "feed updated");
                Ok(())
            }
            Err(err) => {
                tracing::warn!(feed = ?kind, error = %err, "feed fetch failed");
                state.notification.show(Notification::error(err.message()));
                Err(err.into())
            }
        };
        drop(state);
        self.notify_changed();
        outcome
    }

    /// Append the next home page.
    ///
    /// No-op when the feed is exhausted or a fetch is already in flight. On
    /// failure the read position is untouched, so calling again retries the
    /// same page.
    pub async fn load_next_page(&self) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let (token, query) = {
            let mut state = self.state.lock();
            let Some(pagination) = state.home.pagination else {
                return Ok(());
            };
            if !pagination.has_more || state.home.is_loading() {
                tracing::trace!(has_more = pagination.has_more, "skipping next page");
                return Ok(());
            }
            let token = state.issue_token();
            state.home.begin(token);
            (token, ListQuery::newest(pagination.limit, pagination.offset))
        };
        self.notify_changed();

        self.run_fetch(
            FeedKind::Home,
            token,
            &user.id,
            self.gateway.list_posts(query),
            Apply::Append,
        )
        .await
    }

    /// Clear the home feed and load page 0, superseding any fetch in flight.
    pub async fn reset_and_load_first_page(&self) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let (token, limit) = {
            let mut state = self.state.lock();
            let token = state.issue_token();
            state.home.reset();
            state.home.begin(token);
            let limit = state
                .home
                .pagination
                .map(|p| p.limit)
                .unwrap_or_else(|| self.config.effective_page_size());
            (token, limit)
        };
        self.notify_changed();

        self.run_fetch(
            FeedKind::Home,
            token,
            &user.id,
            self.gateway.list_posts(ListQuery::newest(limit, 0)),
            Apply::Replace,
        )
        .await
    }

    /// Fetch an unpaged feed in full, superseding any fetch in flight.
    async fn fetch_full(&self, kind: FeedKind) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let request = match kind {
            FeedKind::Home => return self.reset_and_load_first_page().await,
            FeedKind::Profile => self.gateway.list_posts_by_creator(&user.id),
            FeedKind::Saved => self.gateway.list_posts_bookmarked_by(&user.id),
        };
        let token = {
            let mut state = self.state.lock();
            let token = state.issue_token();
            state.feed_mut(kind).begin(token);
            token
        };
        self.notify_changed();

        self.run_fetch(kind, token, &user.id, request, Apply::Replace)
            .await
    }

    /// Pull-to-refresh. Replaces the feed's items wholesale; does not reseed
    /// engagement state.
    pub async fn refresh(&self, kind: FeedKind) -> Result<(), CoreError> {
        self.fetch_full(kind).await
    }

    /// Infinite-scroll. Only the home feed pages; the others are complete.
    pub async fn load_more(&self, kind: FeedKind) -> Result<(), CoreError> {
        match kind {
            FeedKind::Home => self.load_next_page().await,
            FeedKind::Profile | FeedKind::Saved => Ok(()),
        }
    }

    // ===== Optimistic mutations =====

    /// Flip the like flag locally, then write the liker set.
    ///
    /// Panics if `post_id` has no engagement entry.
    pub async fn toggle_like(&self, post_id: &str) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let (previous, optimistic) = {
            let mut state = self.state.lock();
            let entry = state.engagement.expect_mut(post_id);
            let previous = *entry;
            entry.toggle_like();
            (previous, *entry)
        };
        self.notify_changed();
        tracing::debug!(
            post_id,
            liked = optimistic.is_liked_by_me,
            likes = optimistic.like_count,
            "optimistic like"
        );

        let result = async {
            let post = self.gateway.get_post(post_id).await?;
            let likers = toggled_membership(&post.likers, &user.id, optimistic.is_liked_by_me);
            self.gateway.update_post_likers(post_id, likers).await
        }
        .await;

        self.settle_mutation(post_id, previous, optimistic, result)
    }

    /// Flip the saved flag locally, write the bookmark set, then refresh the
    /// saved feed. Once the write has landed a failed refresh only leaves
    /// its error notification; the call still succeeds.
    ///
    /// Panics if `post_id` has no engagement entry.
    pub async fn toggle_save(&self, post_id: &str) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let (previous, optimistic) = {
            let mut state = self.state.lock();
            let entry = state.engagement.expect_mut(post_id);
            let previous = *entry;
            entry.toggle_save();
            (previous, *entry)
        };
        self.notify_changed();
        tracing::debug!(post_id, saved = optimistic.is_saved_by_me, "optimistic save");

        let result = async {
            let post = self.gateway.get_post(post_id).await?;
            let bookmarkers =
                toggled_membership(&post.bookmarkers, &user.id, optimistic.is_saved_by_me);
            self.gateway.update_post_bookmarks(post_id, bookmarkers).await
        }
        .await;

        let written = result.is_ok();
        self.settle_mutation(post_id, previous, optimistic, result)?;
        if written {
            if let Err(err) = self.fetch_full(FeedKind::Saved).await {
                tracing::warn!(post_id, error = %err, "saved feed refresh failed after bookmark write");
            }
        }
        Ok(())
    }

    fn settle_mutation(
        &self,
        post_id: &str,
        previous: EngagementState,
        optimistic: EngagementState,
        result: Result<Post, GatewayError>,
    ) -> Result<(), CoreError> {
        let err = match result {
            Ok(post) => {
                self.state.lock().patch_post(&post);
                self.notify_changed();
                return Ok(());
            }
            Err(err) => err,
        };

        match self.config.mutation_policy {
            MutationPolicy::KeepOptimistic => {
                tracing::warn!(post_id, error = %err, "engagement write failed, keeping optimistic state");
                Ok(())
            }
            MutationPolicy::Rollback => {
                let restored = {
                    let mut state = self.state.lock();
                    let restored = state.engagement.restore_if(post_id, optimistic, previous);
                    state.notification.show(Notification::error(err.message()));
                    restored
                };
                tracing::warn!(post_id, restored, error = %err, "engagement write failed");
                self.notify_changed();
                Err(err.into())
            }
        }
    }

    /// Re-derive one post's engagement from the server copy instead of a
    /// full reseed.
    pub async fn reconcile_post(&self, post_id: &str) -> Result<(), CoreError> {
        let user = self.session.require_user()?;
        let post = match self.gateway.get_post(post_id).await {
            Ok(post) => post,
            Err(err) => {
                tracing::warn!(post_id, error = %err, "reconcile fetch failed");
                self.show(Notification::error(err.message()));
                return Err(err.into());
            }
        };
        {
            let mut state = self.state.lock();
            state.engagement.reconcile(&post, &user.id);
            state.patch_post(&post);
        }
        self.notify_changed();
        Ok(())
    }

    // ===== Create / delete =====

    /// Validate locally, create through the gateway, then reseed so the new
    /// post's engagement is derived rather than assumed.
    pub async fn create_post(&self, form: &PostForm) -> Result<Post, CoreError> {
        let user = self.session.require_user()?;
        let new_post = match form.validate(&user.id) {
            Ok(new_post) => new_post,
            Err(err) => {
                self.show(Notification::validation(err.to_string()));
                return Err(err.into());
            }
        };

        let post = match self.gateway.create_post(&new_post).await {
            Ok(post) => post,
            Err(err) => {
                tracing::warn!(error = %err, "create post failed");
                self.show(Notification::error(messages::POST_UPLOAD_FAILED));
                return Err(err.into());
            }
        };
        tracing::info!(post_id = %post.id, "post created");

        // A failed reload already raised its own notification
        match self.reseed().await {
            Ok(()) => self.show(Notification::success(messages::POST_UPLOADED)),
            Err(err) => tracing::warn!(post_id = %post.id, error = %err, "reload after create failed"),
        }
        Ok(post)
    }

    /// Delete through the gateway, then reload every owned feed. The id is
    /// never spliced out of pages locally.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), CoreError> {
        self.session.require_user()?;
        if let Err(err) = self.gateway.delete_post(post_id).await {
            tracing::warn!(post_id, error = %err, "delete post failed");
            self.show(Notification::error(messages::POST_DELETE_FAILED));
            return Err(err.into());
        }
        tracing::info!(post_id, "post deleted");

        self.reload_all().await?;
        self.show(Notification::success(messages::POST_DELETED));
        Ok(())
    }

    /// End the session and drop all cached state.
    pub async fn sign_out(&self) -> Result<(), CoreError> {
        let result = self.session.sign_out().await;
        self.state.lock().clear();
        self.notify_changed();
        tracing::info!("signed out, feed cache cleared");
        result
    }

    // ===== Queries =====

    pub fn feed(&self, kind: FeedKind) -> FeedSnapshot {
        self.state.lock().feed(kind).snapshot()
    }

    pub fn items(&self, kind: FeedKind) -> Vec<Post> {
        self.state.lock().feed(kind).items.clone()
    }

    /// Home feed read position
    pub fn pagination(&self) -> Option<PaginationState> {
        self.state.lock().home.pagination
    }

    pub fn engagement(&self, post_id: &str) -> Option<EngagementState> {
        self.state.lock().engagement.get(post_id)
    }

    pub fn is_liked(&self, post_id: &str) -> bool {
        self.engagement(post_id)
            .map(|e| e.is_liked_by_me)
            .unwrap_or(false)
    }

    pub fn like_count(&self, post_id: &str) -> u32 {
        self.engagement(post_id).map(|e| e.like_count).unwrap_or(0)
    }

    pub fn is_saved(&self, post_id: &str) -> bool {
        self.engagement(post_id)
            .map(|e| e.is_saved_by_me)
            .unwrap_or(false)
    }

    pub fn seed_len(&self) -> usize {
        self.state.lock().seed.len()
    }

    pub fn profile_post_count(&self) -> usize {
        self.state.lock().profile.items.len()
    }

    /// Saved posts whose title contains every `+`-separated term.
    pub fn search_saved(&self, query: &str) -> Vec<Post> {
        let query = SearchQuery::parse(query);
        self.state
            .lock()
            .saved
            .items
            .iter()
            .filter(|p| query.matches(&p.title))
            .cloned()
            .collect()
    }

    pub fn notification(&self) -> Option<Notification> {
        self.state.lock().notification.current().cloned()
    }

    pub fn dismiss_notification(&self) {
        self.state.lock().notification.dismiss();
        self.notify_changed();
    }
}
