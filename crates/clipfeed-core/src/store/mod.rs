pub mod engagement_store;
pub mod feed_cache;
pub mod feeds;
pub mod pagination;

pub use engagement_store::EngagementStore;
pub use feed_cache::FeedCache;
pub use feeds::{Feed, FeedKind, FeedSnapshot};
pub use pagination::PaginationState;
