use crate::gateway::GatewayError;
use crate::models::ValidationError;

/// Errors surfaced by the session and the feed cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Not signed in")]
    NotSignedIn,
    #[error("Invalid config: {message}")]
    Config { message: String },
}
