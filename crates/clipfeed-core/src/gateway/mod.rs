//! Contract of the remote document store.
//!
//! Everything the client knows about the server goes through
//! [`PostGateway`]. The feed cache treats every failure identically: the
//! error's message is what the user sees.

pub mod memory;

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::models::{NewPost, Post, ProfileUpdate, User};

pub use memory::{Fixture, FixtureUser, GatewayOp, MemoryGateway};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("{message}")]
    Remote { message: String },
    #[error("Document with the requested ID could not be found: {id}")]
    NotFound { id: String },
    #[error("Invalid credentials. Please check the email and password.")]
    InvalidCredentials,
    #[error("User is not signed in")]
    Unauthorized,
}

impl GatewayError {
    pub fn remote(message: impl Into<String>) -> Self {
        GatewayError::Remote {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        GatewayError::NotFound { id: id.into() }
    }

    /// Human-readable text for notifications
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// A window over all posts, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub offset: usize,
}

impl ListQuery {
    pub fn newest(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

#[async_trait]
pub trait PostGateway: Send + Sync {
    // ===== Account =====

    /// The signed-in user's profile, or `None` when there is no session.
    async fn current_user(&self) -> Result<Option<User>, GatewayError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, GatewayError>;

    async fn create_account(
        &self,
        email: &str,
        password: &str,
        username: &str,
    ) -> Result<User, GatewayError>;

    async fn sign_out(&self) -> Result<(), GatewayError>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
        -> Result<User, GatewayError>;

    async fn change_password(&self, new: &str, current: &str) -> Result<(), GatewayError>;

    // ===== Listings =====

    async fn list_posts(&self, query: ListQuery) -> Result<Vec<Post>, GatewayError>;

    /// Every post, newest first. Used only to seed engagement state.
    async fn list_all_posts(&self) -> Result<Vec<Post>, GatewayError>;

    async fn list_posts_by_creator(&self, user_id: &str) -> Result<Vec<Post>, GatewayError>;

    async fn list_posts_bookmarked_by(&self, user_id: &str) -> Result<Vec<Post>, GatewayError>;

    async fn search_posts_by_title(&self, query: &str) -> Result<Vec<Post>, GatewayError>;

    // ===== Single documents =====

    async fn get_post(&self, id: &str) -> Result<Post, GatewayError>;

    async fn update_post_likers(
        &self,
        id: &str,
        likers: BTreeSet<String>,
    ) -> Result<Post, GatewayError>;

    async fn update_post_bookmarks(
        &self,
        id: &str,
        bookmarkers: BTreeSet<String>,
    ) -> Result<Post, GatewayError>;

    /// Deletes the post and both of its media files.
    async fn delete_post(&self, id: &str) -> Result<(), GatewayError>;

    /// Uploads the media and writes the post record.
    async fn create_post(&self, post: &NewPost) -> Result<Post, GatewayError>;
}

/// `set` with `user_id` present or absent. Adding a present id or removing
/// an absent one leaves the set unchanged.
pub fn toggled_membership(
    set: &BTreeSet<String>,
    user_id: &str,
    present: bool,
) -> BTreeSet<String> {
    let mut updated = set.clone();
    if present {
        updated.insert(user_id.to_string());
    } else {
        updated.remove(user_id);
    }
    updated
}

/// Storage file id embedded in a media URI (`.../files/<id>/view...`).
pub fn file_id_from_uri(uri: &str) -> Option<&str> {
    let (_, rest) = uri.split_once("/files/")?;
    let (id, _) = rest.split_once('/')?;
    if id.is_empty() || id.contains('?') {
        return None;
    }
    Some(id)
}
