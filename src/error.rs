//! Error types for pagekv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using PageError
pub type Result<T> = std::result::Result<T, PageError>;

/// Unified error type for pagekv operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PageError {
    // -------------------------------------------------------------------------
    // Caller Misuse
    // -------------------------------------------------------------------------
    #[error("no paging id is defined in '{type_name}' value")]
    MissingId { type_name: &'static str },

    #[error("invalid type of meta key: {0}")]
    InvalidMetaKeyType(String),

    #[error("raw value is not a serialized payload")]
    NotText,

    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Navigation Errors
    // -------------------------------------------------------------------------
    #[error("cannot find the cursor with given id: {0}")]
    CursorNotFound(String),

    // -------------------------------------------------------------------------
    // Per-item Absence
    // -------------------------------------------------------------------------
    #[error("nil reply")]
    Nil,

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    #[error("WRONGTYPE operation against a key holding the wrong kind of value: {0}")]
    WrongType(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PageError {
    /// True for the per-item "no such key" reply
    pub fn is_nil(&self) -> bool {
        matches!(self, PageError::Nil)
    }
}

impl From<serde_json::Error> for PageError {
    fn from(err: serde_json::Error) -> Self {
        PageError::Serialization(err.to_string())
    }
}
