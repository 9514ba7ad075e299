//! Error types for save-document parsing

use thiserror::Error;

/// Errors while decoding a save document.
///
/// None of these are fatal to callers: every load site degrades to a fresh
/// skeleton document on error.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("malformed save document")]
    Malformed(#[from] serde_json::Error),

    #[error("save header mismatch: expected {expected:?}, found {found:?}")]
    HeaderMismatch { expected: String, found: String },

    #[error("save lists {found} boss states but only {known} bosses are known")]
    BossCountExceeded { found: usize, known: usize },

    #[error("boss state at index {index} is not numeric")]
    NotNumeric { index: usize },

    #[error("additional value {key:?} has the wrong type")]
    ValueTypeMismatch { key: String },
}
