//! Error types for pixel-levels.
//!
//! Input that fails validation is not an error here; it comes back as
//! [`Outcome::Rejected`](crate::Outcome). Errors are reserved for the
//! collaborators themselves failing.

use thiserror::Error;

/// Result type for pixel-levels operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in progression operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted store failed to read or write.
    #[error("Store error: {0}")]
    Store(String),

    /// A stored record could not be decoded.
    #[error("Corrupt record for {user_id}: {reason}")]
    CorruptRecord { user_id: String, reason: String },

    /// Level curve parameters that would not converge.
    #[error("invalid level curve: base {base}, add {add}")]
    InvalidCurve { base: i64, add: i64 },
}
