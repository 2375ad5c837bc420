pub mod alert;
pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod models;
pub mod queries;
pub mod search;
pub mod session;
pub mod store;
pub mod tracing_setup;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export the consumer-facing surface at crate root for convenience
pub use alert::AlertChannel;
pub use config::{FeedConfig, MutationPolicy};
pub use error::CoreError;
pub use gateway::{GatewayError, MemoryGateway, PostGateway};
pub use session::Session;
pub use store::{FeedCache, FeedKind, FeedSnapshot};
