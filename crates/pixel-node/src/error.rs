//! Error types for the Pixel node.

use thiserror::Error;

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in node operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// The store could not be opened within the retry budget
    #[error("Store unavailable after {attempts} attempts: {last}")]
    StoreUnavailable { attempts: u32, last: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Progression core error
    #[error(transparent)]
    Levels(#[from] pixel_levels::Error),

    /// Rank card error
    #[error(transparent)]
    RankCard(#[from] pixel_rankcard::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

impl From<Error> for pixel_levels::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Levels(inner) => inner,
            other => pixel_levels::Error::Store(other.to_string()),
        }
    }
}
