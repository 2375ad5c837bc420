//! Lists owned by individual screens rather than the feed cache.

use std::sync::Arc;

use crate::alert::AlertChannel;
use crate::gateway::{ListQuery, PostGateway};
use crate::models::Post;

/// Newest `limit` posts for the trending strip. Unpaged. The first load has
/// finished when this returns.
pub async fn latest_posts_channel(
    gateway: Arc<dyn PostGateway>,
    limit: usize,
) -> AlertChannel<Vec<Post>> {
    AlertChannel::start(move || {
        let gateway = gateway.clone();
        async move { gateway.list_posts(ListQuery::newest(limit, 0)).await }
    })
    .await
}

/// Title search results for `query`, loaded once before returning.
pub async fn search_posts_channel(
    gateway: Arc<dyn PostGateway>,
    query: &str,
) -> AlertChannel<Vec<Post>> {
    let query = query.to_string();
    AlertChannel::start(move || {
        let gateway = gateway.clone();
        let query = query.clone();
        async move { gateway.search_posts_by_title(&query).await }
    })
    .await
}
