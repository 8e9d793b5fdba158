//! Unified error type for every remote-backed operation.
//!
//! Whatever the screen or endpoint, a failed action surfaces as one
//! [`OperationError`]. Callers that only need to decide how to present the
//! failure can match on [`OperationError::kind`].
use thiserror::Error;

/// Coarse classification of an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input was missing or blank; nothing was sent.
    Precondition,
    /// The request never produced a usable response.
    Transport,
    /// The server answered with a non-success status.
    Rejected,
}

#[derive(Debug, Error)]
pub enum OperationError {
    /// Missing user id, blank email, blank title, empty scope key.
    #[error("{0}")]
    Precondition(String),

    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),

    /// The body arrived but was not the JSON we expected.
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Non-2xx status. `message` is the server's `error`/`message` field when present.
    #[error("Server rejected request (status {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Rejected {
        status: u16,
        message: Option<String>,
    },
}

impl OperationError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        OperationError::Precondition(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Precondition(_) => ErrorKind::Precondition,
            OperationError::Network(_)
            | OperationError::Timeout(_)
            | OperationError::ResponseTooLarge(_)
            | OperationError::Decode(_) => ErrorKind::Transport,
            OperationError::Rejected { .. } => ErrorKind::Rejected,
        }
    }

    /// Message suitable for an alert: the server's own text when it gave one.
    pub fn user_message(&self) -> String {
        match self {
            OperationError::Rejected {
                message: Some(m), ..
            } => m.clone(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            OperationError::precondition("no user").kind(),
            ErrorKind::Precondition
        );
        assert_eq!(OperationError::Timeout(15).kind(), ErrorKind::Transport);
        assert_eq!(
            OperationError::ResponseTooLarge(10).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            OperationError::Rejected {
                status: 404,
                message: None
            }
            .kind(),
            ErrorKind::Rejected
        );
    }

    #[test]
    fn test_rejected_display_includes_server_message() {
        let err = OperationError::Rejected {
            status: 400,
            message: Some("Correo no registrado".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Server rejected request (status 400): Correo no registrado"
        );
        assert_eq!(err.user_message(), "Correo no registrado");
    }

    #[test]
    fn test_rejected_display_without_message() {
        let err = OperationError::Rejected {
            status: 500,
            message: None,
        };
        assert_eq!(err.to_string(), "Server rejected request (status 500)");
        assert_eq!(err.user_message(), err.to_string());
    }

    #[test]
    fn test_decode_error_is_transport() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = OperationError::from(json_err);
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().starts_with("Invalid response body"));
    }
}
