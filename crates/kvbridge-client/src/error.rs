//! Client error types

use kvbridge_codec::CodecError;
use thiserror::Error;

/// Errors returned by bridge calls
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Network failure, a body that is not JSON, or a broken stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with an error envelope
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Response JSON that does not decode into keys and values
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Error kind for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    Transport,
    Server,
    Decode,
}

impl ClientError {
    pub fn kind(&self) -> ClientErrorKind {
        match self {
            ClientError::Transport(_) => ClientErrorKind::Transport,
            ClientError::Server { .. } => ClientErrorKind::Server,
            ClientError::Decode(_) => ClientErrorKind::Decode,
        }
    }

    /// HTTP status of a server error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if the call may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Server { status, .. } => *status >= 500,
            ClientError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ClientError::Transport("reset".to_string()).is_retryable());
        assert!(ClientError::Server {
            status: 503,
            message: "Storage unavailable".to_string()
        }
        .is_retryable());
        assert!(!ClientError::Server {
            status: 400,
            message: "bad".to_string()
        }
        .is_retryable());
        assert!(!ClientError::Decode(CodecError::MissingType).is_retryable());
    }

    #[test]
    fn test_display() {
        let err = ClientError::Server {
            status: 400,
            message: "ValidationError: No target key to set.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Server error (400): ValidationError: No target key to set."
        );
        assert_eq!(err.kind(), ClientErrorKind::Server);
        assert_eq!(err.status(), Some(400));
    }
}
