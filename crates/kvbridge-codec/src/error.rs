//! Codec error types

use thiserror::Error;

/// Errors raised while decoding wire keys and values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Key must not be empty")]
    EmptyKey,

    /// A key part that is neither a JSON primitive nor a recognized wrapper
    #[error("Invalid key part: {0}")]
    UnknownPartEncoding(String),

    #[error("No data type provided for the value")]
    MissingType,

    #[error("No data provided for the value")]
    MissingData,

    /// The `data` of an envelope does not have the shape its `type` implies
    #[error("Invalid {expected} received: {found}")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("Unsupported data type: {0}")]
    UnsupportedType(String),
}

impl CodecError {
    pub(crate) fn mismatch(expected: &'static str, found: &serde_json::Value) -> Self {
        CodecError::TypeMismatch {
            expected,
            found: preview(found),
        }
    }
}

/// Render a JSON fragment for an error message, cut to a readable length.
pub(crate) fn preview(value: &serde_json::Value) -> String {
    const MAX_PREVIEW: usize = 64;

    let text = value.to_string();
    if text.chars().count() <= MAX_PREVIEW {
        return text;
    }
    let cut: String = text.chars().take(MAX_PREVIEW).collect();
    format!("{}...", cut)
}

/// Error returned by the strict big integer parser
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid big integer literal: {0:?}")]
pub struct ParseBigIntError(pub String);
