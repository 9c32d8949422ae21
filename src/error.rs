//! Error types for the chat relay.

use thiserror::Error;

/// Failure of one `/api/chat` round trip.
///
/// Every variant is a transport-level failure from the widget's point of
/// view. An application-level `success: false` answer is not an error; it
/// arrives as [`crate::api::BotReply::Failure`].
#[derive(Error, Debug)]
pub enum ChatError {
    /// HTTP request could not be sent or its body could not be read.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-2xx status.
    #[error("chat endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// Body parsed as JSON but does not satisfy the response contract.
    #[error("malformed chat response: {0}")]
    MalformedResponse(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse classification used at the UI boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Non-2xx status, transport failure or unreadable body.
    Network,
    /// Well-formed answer carrying `success: false`.
    Application,
}

impl ChatError {
    /// Classify this error. Every `ChatError` is a network failure.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Network
    }

    /// HTTP status, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for chat operations.
pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_reports_code() {
        let err = ChatError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.to_string(), "chat endpoint returned 503: unavailable");
    }

    #[test]
    fn test_malformed_has_no_status() {
        let err = ChatError::MalformedResponse("missing response".to_string());
        assert_eq!(err.status(), None);
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
