//! Storage error types

use thiserror::Error;

/// Errors raised by storage engines
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Cursor token that this engine did not issue
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Operation not supported by this engine: {0}")]
    Unsupported(&'static str),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
