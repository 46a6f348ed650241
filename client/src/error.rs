//! Client-side error types

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced to callers of the session agent.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status. Carries the
    /// machine-readable code from the response body, unmodified.
    #[error("{message} ({code})")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    /// The server answered with a body that does not match the shape
    /// the agent expected.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The stored credentials are gone: either no login happened or a
    /// refresh failed and the pair was cleared. The presentation
    /// layer turns this into a redirect to login.
    #[error("session expired")]
    SessionExpired,
}

impl ClientError {
    /// The machine-readable code, when the server provided one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_includes_code() {
        let err = ClientError::Api {
            status: StatusCode::UNAUTHORIZED,
            code: "INVALID_TOKEN".into(),
            message: "Invalid token".into(),
        };
        assert_eq!(err.to_string(), "Invalid token (INVALID_TOKEN)");
        assert_eq!(err.code(), Some("INVALID_TOKEN"));
    }

    #[test]
    fn test_session_expired_has_no_code() {
        assert_eq!(ClientError::SessionExpired.code(), None);
    }
}
