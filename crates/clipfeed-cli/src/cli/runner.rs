use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clipfeed_core::gateway::Fixture;
use clipfeed_core::models::{EngagementState, MediaAsset, Post, PostForm, SignInForm};
use clipfeed_core::queries::{latest_posts_channel, search_posts_channel};
use clipfeed_core::{AlertChannel, FeedCache, FeedKind, MemoryGateway, Session};
use serde::Serialize;
use serde_json::{json, Value};

use super::config::CliConfig;

#[derive(Debug, Clone)]
pub enum CliCommand {
    Home { pages: usize },
    Profile,
    Saved { query: Option<String> },
    Latest,
    Search { query: String },
    Like { post_id: String },
    Save { post_id: String },
    Delete { post_id: String },
    Create {
        title: String,
        prompt: String,
        thumbnail: String,
        video: String,
    },
}

impl CliCommand {
    fn mutates(&self) -> bool {
        matches!(
            self,
            CliCommand::Like { .. }
                | CliCommand::Save { .. }
                | CliCommand::Delete { .. }
                | CliCommand::Create { .. }
        )
    }
}

/// Gateway plus an initialized feed cache.
pub struct Workspace {
    pub gateway: Arc<MemoryGateway>,
    pub cache: FeedCache,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostView {
    #[serde(flatten)]
    post: Post,
    engagement: Option<EngagementState>,
}

pub async fn open_workspace(config: &CliConfig) -> Result<Workspace> {
    let gateway = match &config.fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
            MemoryGateway::from_json(&json)
                .with_context(|| format!("Failed to parse fixture: {}", path.display()))?
        }
        None => MemoryGateway::new(),
    };
    let gateway = Arc::new(gateway);
    let session = Session::new(gateway.clone());

    if let Some(creds) = &config.credentials {
        let form = SignInForm {
            email: creds.email.clone(),
            password: creds.password.clone(),
        };
        session.sign_in(&form).await.context("Sign in failed")?;
    }

    let cache = FeedCache::new(gateway.clone(), session, config.feed.clone());
    cache.initialize().await.context("Failed to load feeds")?;
    Ok(Workspace { gateway, cache })
}

/// Run one command and return its JSON output. Mutations are written back
/// to the fixture when `write_back` is set.
pub async fn execute(command: CliCommand, config: &CliConfig, write_back: bool) -> Result<Value> {
    let workspace = open_workspace(config).await?;
    let mutates = command.mutates();
    let output = run(&workspace, command, config).await?;

    if mutates && write_back {
        if let Some(path) = &config.fixture {
            save_fixture(path, &workspace.gateway.to_fixture())?;
            tracing::info!(path = %path.display(), "fixture updated");
        }
    }
    Ok(output)
}

async fn run(workspace: &Workspace, command: CliCommand, config: &CliConfig) -> Result<Value> {
    let cache = &workspace.cache;
    match command {
        CliCommand::Home { pages } => {
            for _ in 1..pages.max(1) {
                cache.load_next_page().await?;
            }
            Ok(feed_json(cache, FeedKind::Home))
        }
        CliCommand::Profile => Ok(feed_json(cache, FeedKind::Profile)),
        CliCommand::Saved { query } => match query {
            Some(query) => Ok(posts_json(cache, cache.search_saved(&query))),
            None => Ok(feed_json(cache, FeedKind::Saved)),
        },
        CliCommand::Latest => {
            let gateway = workspace.gateway.clone();
            let channel = latest_posts_channel(gateway, config.feed.latest_limit).await;
            Ok(posts_json(cache, channel_data(&channel)?))
        }
        CliCommand::Search { query } => {
            let gateway = workspace.gateway.clone();
            let channel = search_posts_channel(gateway, &query).await;
            Ok(posts_json(cache, channel_data(&channel)?))
        }
        CliCommand::Like { post_id } => {
            require_known(cache, &post_id)?;
            cache.toggle_like(&post_id).await?;
            Ok(engagement_json(cache, &post_id))
        }
        CliCommand::Save { post_id } => {
            require_known(cache, &post_id)?;
            cache.toggle_save(&post_id).await?;
            Ok(engagement_json(cache, &post_id))
        }
        CliCommand::Delete { post_id } => {
            cache.delete_post(&post_id).await?;
            Ok(notification_json(cache))
        }
        CliCommand::Create {
            title,
            prompt,
            thumbnail,
            video,
        } => {
            let form = PostForm {
                title,
                prompt,
                thumbnail: Some(media_asset(thumbnail)),
                video: Some(media_asset(video)),
            };
            let post = cache.create_post(&form).await?;
            let mut output = notification_json(cache);
            output["post"] = serde_json::to_value(view(cache, post))?;
            Ok(output)
        }
    }
}

/// Toggling an id the cache never saw is a caller bug inside the library;
/// on the command line it is a typo.
fn require_known(cache: &FeedCache, post_id: &str) -> Result<()> {
    if cache.engagement(post_id).is_none() {
        bail!("Unknown post id: {}", post_id);
    }
    Ok(())
}

fn channel_data(channel: &AlertChannel<Vec<Post>>) -> Result<Vec<Post>> {
    if let Some(notification) = channel.notification() {
        return Err(anyhow!(notification.message));
    }
    Ok(channel.data())
}

fn media_asset(uri: String) -> MediaAsset {
    let mime_type = match Path::new(&uri).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    };
    MediaAsset {
        uri,
        mime_type: mime_type.to_string(),
    }
}

fn view(cache: &FeedCache, post: Post) -> PostView {
    let engagement = cache.engagement(&post.id);
    PostView { post, engagement }
}

fn posts_json(cache: &FeedCache, posts: Vec<Post>) -> Value {
    let items: Vec<PostView> = posts.into_iter().map(|p| view(cache, p)).collect();
    json!({ "items": items })
}

fn feed_json(cache: &FeedCache, kind: FeedKind) -> Value {
    let snapshot = cache.feed(kind);
    let items: Vec<PostView> = snapshot.items.into_iter().map(|p| view(cache, p)).collect();
    json!({
        "feed": kind,
        "items": items,
        "hasMore": snapshot.has_more,
    })
}

fn engagement_json(cache: &FeedCache, post_id: &str) -> Value {
    json!({
        "postId": post_id,
        "engagement": cache.engagement(post_id),
    })
}

fn notification_json(cache: &FeedCache) -> Value {
    json!({ "notification": cache.notification() })
}

fn save_fixture(path: &Path, fixture: &Fixture) -> Result<()> {
    let json = serde_json::to_string_pretty(fixture).context("Failed to serialize fixture")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write fixture: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const FIXTURE: &str = r#"{
        "users": [
            {"id": "ada", "username": "ada", "email": "ada@example.com", "avatar": "", "password": "pw"},
            {"id": "bob", "username": "bob", "email": "bob@example.com", "avatar": "", "password": "pw"}
        ],
        "posts": [
            {"id": "p1", "title": "Desert road", "prompt": "dunes", "thumbnail": "memory://storage/files/t1/view",
             "video": "memory://storage/files/v1/view", "creator": {"id": "bob", "username": "bob"},
             "createdAt": "2024-06-01T10:00:00Z", "likers": ["bob"], "bookmarkers": ["ada"]},
            {"id": "p2", "title": "Ocean sunset", "prompt": "waves", "thumbnail": "memory://storage/files/t2/view",
             "video": "memory://storage/files/v2/view", "creator": {"id": "ada", "username": "ada"},
             "createdAt": "2024-06-01T11:00:00Z"}
        ],
        "signedIn": "ada"
    }"#;

    fn fixture_config(dir: &tempfile::TempDir) -> CliConfig {
        let path: PathBuf = dir.path().join("fixture.json");
        std::fs::write(&path, FIXTURE).unwrap();
        CliConfig {
            fixture: Some(path),
            ..CliConfig::default()
        }
    }

    #[tokio::test]
    async fn test_home_lists_newest_first_with_engagement() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(&dir);

        let output = execute(CliCommand::Home { pages: 1 }, &config, false)
            .await
            .unwrap();
        let items = output["items"].as_array().unwrap();
        assert_eq!(items[0]["id"], "p2");
        assert_eq!(items[1]["engagement"]["likeCount"], 1);
        assert_eq!(items[1]["engagement"]["isSavedByMe"], true);
        assert_eq!(output["hasMore"], false);
    }

    #[tokio::test]
    async fn test_like_writes_back_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(&dir);
        let like = || CliCommand::Like {
            post_id: "p1".to_string(),
        };

        let output = execute(like(), &config, false).await.unwrap();
        assert_eq!(output["engagement"]["isLikedByMe"], true);
        assert_eq!(output["engagement"]["likeCount"], 2);

        // Nothing persisted, so liking again starts from the same state
        let output = execute(like(), &config, true).await.unwrap();
        assert_eq!(output["engagement"]["likeCount"], 2);

        let output = execute(like(), &config, false).await.unwrap();
        assert_eq!(output["engagement"]["isLikedByMe"], false);
    }

    #[tokio::test]
    async fn test_unknown_post_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(&dir);
        let err = execute(
            CliCommand::Save {
                post_id: "nope".to_string(),
            },
            &config,
            false,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn test_saved_search_and_remote_search() {
        let dir = tempfile::tempdir().unwrap();
        let config = fixture_config(&dir);

        let saved = execute(
            CliCommand::Saved {
                query: Some("road".to_string()),
            },
            &config,
            false,
        )
        .await
        .unwrap();
        assert_eq!(saved["items"].as_array().unwrap().len(), 1);

        let found = execute(
            CliCommand::Search {
                query: "ocean".to_string(),
            },
            &config,
            false,
        )
        .await
        .unwrap();
        assert_eq!(found["items"][0]["id"], "p2");
    }

    #[tokio::test]
    async fn test_without_session_initialization_fails() {
        let err = execute(CliCommand::Profile, &CliConfig::default(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load feeds"));
    }

    #[tokio::test]
    async fn test_demo_fixture_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        std::fs::write(&path, include_str!("../../fixtures/demo.json")).unwrap();
        let config = CliConfig {
            fixture: Some(path),
            ..CliConfig::default()
        };

        let workspace = open_workspace(&config).await.unwrap();
        assert_eq!(workspace.cache.feed(FeedKind::Home).items.len(), 5);
        assert_eq!(workspace.cache.profile_post_count(), 2);
        assert!(workspace.cache.is_saved("clip-04"));
        assert_eq!(workspace.cache.like_count("clip-02"), 2);
    }
}
