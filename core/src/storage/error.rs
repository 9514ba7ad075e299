//! Error types for durable-storage operations

use thiserror::Error;

/// Errors while loading the lock tables at boot.
///
/// Write-path operations are fire-and-forget and report failures through
/// logging instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend unavailable")]
    Unavailable,

    #[error("corrupt lock row: {reason}")]
    CorruptRow { reason: String },

    #[error("IO error")]
    Io(#[from] std::io::Error),
}
