//! Error types for mrx-agent

use std::time::Duration;
use thiserror::Error;

/// Result type alias using mrx-agent Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a conversation turn
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the AI provider layer
    #[error(transparent)]
    Ai(#[from] mrx_ai::Error),

    /// An LLM call did not finish in time
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    /// The generation stream reported an error or produced nothing
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A status string outside the fixed set
    #[error("Unknown status: {0}")]
    UnknownStatus(String),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout(_))
    }
}
