//! Error types for pixel-rankcard.

use std::time::Duration;
use thiserror::Error;

/// Result type for rank card operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a rank card.
#[derive(Debug, Error)]
pub enum Error {
    /// The avatar service failed
    #[error("Avatar fetch failed: {0}")]
    Avatar(String),

    /// The avatar service did not answer in time
    #[error("Avatar fetch timed out after {0:?}")]
    AvatarTimeout(Duration),
}
