//! Errors for the runtime crate.

use bustrackr_transit::TransitError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The upstream provider failed or timed out; the previous feed
    /// snapshot stays in effect.
    #[error("upstream fetch failed: {0}")]
    Fetch(String),

    #[error("catalog document: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Transit(#[from] TransitError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
