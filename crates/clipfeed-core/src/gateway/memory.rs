//! In-process implementation of [`PostGateway`].
//!
//! Backs the CLI (loaded from a JSON fixture) and the unit tests. Every call
//! yields to the scheduler once before touching state, so concurrently
//! issued operations interleave the way network calls would. Failures can be
//! queued per operation with [`MemoryGateway::fail_next`].

use std::collections::{BTreeSet, HashMap, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::{file_id_from_uri, GatewayError, ListQuery, PostGateway};
use crate::models::{Creator, MediaAsset, NewPost, Post, ProfileUpdate, User};
use crate::search::SearchQuery;

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    CurrentUser,
    SignIn,
    CreateAccount,
    SignOut,
    UpdateProfile,
    ChangePassword,
    ListPosts,
    ListAllPosts,
    ListPostsByCreator,
    ListPostsBookmarkedBy,
    SearchPosts,
    GetPost,
    UpdatePostLikers,
    UpdatePostBookmarks,
    DeletePost,
    CreatePost,
}

/// A user account in a fixture file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureUser {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

/// Seed data for a [`MemoryGateway`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub users: Vec<FixtureUser>,
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Id of the user with an active session, if any
    #[serde(default)]
    pub signed_in: Option<String>,
}

#[derive(Default)]
struct MemoryState {
    users: Vec<FixtureUser>,
    posts: Vec<Post>,
    /// Stored media file ids
    media: BTreeSet<String>,
    session: Option<String>,
    failures: HashMap<GatewayOp, VecDeque<GatewayError>>,
    calls: HashMap<GatewayOp, usize>,
}

impl MemoryState {
    fn newest_first(&self) -> Vec<Post> {
        let mut posts = self.posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts
    }

    fn post_mut(&mut self, id: &str) -> Result<&mut Post, GatewayError> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| GatewayError::not_found(id))
    }

    fn signed_in_user(&self) -> Option<&User> {
        let id = self.session.as_deref()?;
        self.users.iter().map(|u| &u.user).find(|u| u.id == id)
    }

    fn store_media(&mut self, asset: &MediaAsset) -> String {
        let file_id = uuid::Uuid::new_v4().simple().to_string();
        self.media.insert(file_id.clone());
        tracing::debug!(source = %asset.uri, file_id = %file_id, "stored media");
        format!("memory://storage/files/{}/view", file_id)
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<MemoryState>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let media = fixture
            .posts
            .iter()
            .flat_map(|p| [p.thumbnail.as_str(), p.video.as_str()])
            .filter_map(file_id_from_uri)
            .map(str::to_string)
            .collect();
        Self {
            state: Mutex::new(MemoryState {
                users: fixture.users,
                posts: fixture.posts,
                media,
                session: fixture.signed_in,
                ..MemoryState::default()
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(Self::from_fixture(fixture))
    }

    /// Current users, posts and session, in the shape `from_fixture` reads.
    pub fn to_fixture(&self) -> Fixture {
        let state = self.state.lock();
        Fixture {
            users: state.users.clone(),
            posts: state.posts.clone(),
            signed_in: state.session.clone(),
        }
    }

    pub fn add_user(&self, user: User, password: &str) {
        self.state.lock().users.push(FixtureUser {
            user,
            password: password.to_string(),
        });
    }

    pub fn add_post(&self, post: Post) {
        self.state.lock().posts.push(post);
    }

    /// Start (or end, with `None`) a session without going through sign-in.
    pub fn set_signed_in(&self, user_id: Option<&str>) {
        self.state.lock().session = user_id.map(str::to_string);
    }

    /// Make the next call of `op` fail with `message`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, op: GatewayOp, message: &str) {
        self.state
            .lock()
            .failures
            .entry(op)
            .or_default()
            .push_back(GatewayError::remote(message));
    }

    /// How many times `op` has been called, failed calls included.
    pub fn calls(&self, op: GatewayOp) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn post(&self, id: &str) -> Option<Post> {
        self.state.lock().posts.iter().find(|p| p.id == id).cloned()
    }

    pub fn post_count(&self) -> usize {
        self.state.lock().posts.len()
    }

    pub fn media_count(&self) -> usize {
        self.state.lock().media.len()
    }

    /// Suspension point plus bookkeeping shared by every call.
    async fn enter(&self, op: GatewayOp) -> Result<(), GatewayError> {
        tokio::task::yield_now().await;
        let mut state = self.state.lock();
        *state.calls.entry(op).or_default() += 1;
        match state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PostGateway for MemoryGateway {
    async fn current_user(&self) -> Result<Option<User>, GatewayError> {
        self.enter(GatewayOp::CurrentUser).await?;
        Ok(self.state.lock().signed_in_user().cloned())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, GatewayError> {
        self.enter(GatewayOp::SignIn).await?;
        let mut state = self.state.lock();
        let user = state
            .users
            .iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email) && u.password == password)
            .map(|u| u.user.clone())
            .ok_or(GatewayError::InvalidCredentials)?;
        state.session = Some(user.id.clone());
        Ok(user)
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User, GatewayError> {
        self.enter(GatewayOp::CreateAccount).await?;
        let mut state = self.state.lock();
        if state
            .users
            .iter()
            .any(|u| u.user.email.eq_ignore_ascii_case(email))
        {
            return Err(GatewayError::remote(
                "A user with the same id, email, or phone already exists in this project.",
            ));
        }
        let user = User {
            id: uuid::Uuid::new_v4().simple().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            avatar: format!("memory://avatars/initials?name={}", username),
            bio: None,
        };
        state.users.push(FixtureUser {
            user: user.clone(),
            password: password.to_string(),
        });
        state.session = Some(user.id.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), GatewayError> {
        self.enter(GatewayOp::SignOut).await?;
        self.state.lock().session = None;
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, GatewayError> {
        self.enter(GatewayOp::UpdateProfile).await?;
        let mut state = self.state.lock();
        let record = state
            .users
            .iter_mut()
            .find(|u| u.user.id == user_id)
            .ok_or_else(|| GatewayError::not_found(user_id))?;
        update.apply_to(&mut record.user);
        let user = record.user.clone();

        // Posts carry a denormalized copy of the creator
        let creator = Creator::from(&user);
        for post in state.posts.iter_mut().filter(|p| p.creator.id == user_id) {
            post.creator = creator.clone();
        }
        Ok(user)
    }

    async fn change_password(&self, new: &str, current: &str) -> Result<(), GatewayError> {
        self.enter(GatewayOp::ChangePassword).await?;
        let mut state = self.state.lock();
        let session = state.session.clone().ok_or(GatewayError::Unauthorized)?;
        let record = state
            .users
            .iter_mut()
            .find(|u| u.user.id == session)
            .ok_or(GatewayError::Unauthorized)?;
        if record.password != current {
            return Err(GatewayError::InvalidCredentials);
        }
        record.password = new.to_string();
        Ok(())
    }

    async fn list_posts(&self, query: ListQuery) -> Result<Vec<Post>, GatewayError> {
        self.enter(GatewayOp::ListPosts).await?;
        let state = self.state.lock();
        Ok(state
            .newest_first()
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, GatewayError> {
        self.enter(GatewayOp::ListAllPosts).await?;
        Ok(self.state.lock().newest_first())
    }

    async fn list_posts_by_creator(&self, user_id: &str) -> Result<Vec<Post>, GatewayError> {
        self.enter(GatewayOp::ListPostsByCreator).await?;
        let state = self.state.lock();
        Ok(state
            .newest_first()
            .into_iter()
            .filter(|p| p.is_created_by(user_id))
            .collect())
    }

    async fn list_posts_bookmarked_by(&self, user_id: &str) -> Result<Vec<Post>, GatewayError> {
        self.enter(GatewayOp::ListPostsBookmarkedBy).await?;
        let state = self.state.lock();
        Ok(state
            .posts
            .iter()
            .filter(|p| p.is_bookmarked_by(user_id))
            .cloned()
            .collect())
    }

    async fn search_posts_by_title(&self, query: &str) -> Result<Vec<Post>, GatewayError> {
        self.enter(GatewayOp::SearchPosts).await?;
        let query = SearchQuery::parse(query);
        let state = self.state.lock();
        Ok(state
            .posts
            .iter()
            .filter(|p| query.matches(&p.title))
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: &str) -> Result<Post, GatewayError> {
        self.enter(GatewayOp::GetPost).await?;
        self.state
            .lock()
            .posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found(id))
    }

    async fn update_post_likers(
        &self,
        id: &str,
        likers: BTreeSet<String>,
    ) -> Result<Post, GatewayError> {
        self.enter(GatewayOp::UpdatePostLikers).await?;
        let mut state = self.state.lock();
        let post = state.post_mut(id)?;
        post.likers = likers;
        Ok(post.clone())
    }

    async fn update_post_bookmarks(
        &self,
        id: &str,
        bookmarkers: BTreeSet<String>,
    ) -> Result<Post, GatewayError> {
        self.enter(GatewayOp::UpdatePostBookmarks).await?;
        let mut state = self.state.lock();
        let post = state.post_mut(id)?;
        post.bookmarkers = bookmarkers;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str) -> Result<(), GatewayError> {
        self.enter(GatewayOp::DeletePost).await?;
        let mut state = self.state.lock();
        let index = state
            .posts
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GatewayError::not_found(id))?;
        let post = state.posts.remove(index);
        for uri in [&post.thumbnail, &post.video] {
            if let Some(file_id) = file_id_from_uri(uri) {
                state.media.remove(file_id);
            }
        }
        Ok(())
    }

    async fn create_post(&self, new_post: &NewPost) -> Result<Post, GatewayError> {
        self.enter(GatewayOp::CreatePost).await?;
        let mut state = self.state.lock();
        let creator = state
            .users
            .iter()
            .map(|u| &u.user)
            .find(|u| u.id == new_post.creator_id)
            .map(Creator::from)
            .ok_or_else(|| GatewayError::not_found(&new_post.creator_id))?;
        let thumbnail = state.store_media(&new_post.thumbnail);
        let video = state.store_media(&new_post.video);
        let post = Post {
            id: uuid::Uuid::new_v4().simple().to_string(),
            title: new_post.title.clone(),
            prompt: new_post.prompt.clone(),
            thumbnail,
            video,
            creator,
            created_at: Utc::now(),
            likers: BTreeSet::new(),
            bookmarkers: BTreeSet::new(),
        };
        state.posts.push(post.clone());
        Ok(post)
    }
}
