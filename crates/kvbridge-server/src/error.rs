//! Bridge error types and their HTTP mapping
//!
//! Client mistakes (bad parameters, undecodable keys or values) map to 400
//! with a message naming the problem. Everything else maps to 500 with a
//! fixed message; the detail goes to the log only.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use kvbridge_codec::CodecError;
use kvbridge_store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Invalid request parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid limit option: must be positive integer. Got: {0}")]
    InvalidLimit(String),

    /// Names the operation that needed the key
    #[error("No target key to {0}.")]
    MissingKey(&'static str),

    #[error("Invalid expiration time option: It must be a positive number in milliseconds. Got: {0}")]
    InvalidExpiration(String),

    #[error("Invalid cursor option: {0}")]
    InvalidCursor(String),

    /// The query string or path could not be extracted at all
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

/// Errors returned by bridge handlers
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A key or value failed to decode
    #[error("SerializationError: {context}: {source}")]
    Serialization {
        context: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("ValidationError: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Unexpected server error: {0}")]
    Unexpected(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    pub fn serialization(context: &'static str, source: CodecError) -> Self {
        BridgeError::Serialization { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::Serialization { .. } | BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::StorageUnavailable(_) | BridgeError::Unexpected(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message sent to the caller
    pub fn public_message(&self) -> String {
        match self {
            BridgeError::StorageUnavailable(_) => "Storage unavailable".to_string(),
            BridgeError::Unexpected(_) => "Unexpected server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<StoreError> for BridgeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidCursor(cursor) => ValidationError::InvalidCursor(cursor).into(),
            StoreError::Unavailable(detail) => BridgeError::StorageUnavailable(detail),
            other @ (StoreError::Unsupported(_) | StoreError::Storage(_)) => {
                BridgeError::Unexpected(other.to_string())
            }
        }
    }
}

impl From<QueryRejection> for BridgeError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl From<PathRejection> for BridgeError {
    fn from(rejection: PathRejection) -> Self {
        ValidationError::MalformedRequest(rejection.body_text()).into()
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message() {
        let err = BridgeError::from(ValidationError::InvalidLimit("-1".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "ValidationError: Invalid limit option: must be positive integer. Got: -1"
        );
    }

    #[test]
    fn test_missing_key_message() {
        assert_eq!(
            ValidationError::MissingKey("delete").to_string(),
            "No target key to delete."
        );
    }

    #[test]
    fn test_serialization_message_names_context() {
        let err = BridgeError::serialization("key", CodecError::EmptyKey);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.public_message(),
            "SerializationError: key: Key must not be empty"
        );
    }

    #[test]
    fn test_server_errors_hide_detail() {
        let err = BridgeError::from(StoreError::Unavailable("disk on fire".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_message().contains("disk"));
    }

    #[test]
    fn test_invalid_cursor_is_client_error() {
        let err = BridgeError::from(StoreError::InvalidCursor("zz".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
