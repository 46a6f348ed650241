//! Machine-readable authentication outcome codes
//!
//! These codes are the contract between the server and the client
//! session agent: the agent branches on `TOKEN_EXPIRED` specifically,
//! so no other failure may carry that code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Authentication failure codes carried in 401/403 response bodies.
///
/// `INVALID_REFRESH` deliberately covers expired, unknown, and
/// already-rotated refresh secrets without distinguishing them, so a
/// caller learns nothing about which case occurred.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthCode {
    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Account is deactivated")]
    AccountInactive,

    #[error("No token provided")]
    NoToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid or expired refresh token")]
    InvalidRefresh,

    #[error("Password does not meet the minimum length")]
    WeakPassword,
}

impl AuthCode {
    /// Wire representation, as carried in the `code` field of error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadCredentials => "BAD_CREDENTIALS",
            Self::AccountInactive => "ACCOUNT_INACTIVE",
            Self::NoToken => "NO_TOKEN",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidRefresh => "INVALID_REFRESH",
            Self::WeakPassword => "WEAK_PASSWORD",
        }
    }
}
