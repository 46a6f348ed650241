//! Access token issue and verification
//!
//! Access tokens are short-lived HS256 JWTs carrying the account id
//! and role. They are never persisted; validity is computed from the
//! signature and expiry at verification time. Keys are pre-computed
//! once at startup and shared via `AppState`.

use chrono::{Duration, Utc};
use jobdeck_shared::Role;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Access token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Account role at issue time
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl AccessClaims {
    /// Parse the subject as an account id.
    pub fn user_id(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|_| TokenError::Invalid)
    }
}

/// Verification failure kinds. Callers react differently to these:
/// `Expired` triggers the client refresh flow, `Invalid` never does.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token invalid")]
    Invalid,
}

/// Pre-computed HS256 keys, wrapped in Arc for cheap cloning.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret)),
            decoding: Arc::new(DecodingKey::from_secret(secret)),
        }
    }
}

/// Token issuer/verifier with pre-computed keys.
///
/// Create once at startup and store in `AppState`; cloning is O(1).
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    access_ttl_secs: i64,
}

impl TokenService {
    pub fn new(secret: &[u8], access_ttl_secs: i64) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            access_ttl_secs,
        }
    }

    /// Mint an access token for an account. Pure function of the
    /// inputs, the clock, and the signing secret.
    pub fn issue_access(&self, user_id: Uuid, role: Role) -> anyhow::Result<String> {
        self.issue_access_with_ttl(user_id, role, self.access_ttl_secs)
    }

    /// Mint an access token with an explicit TTL. A negative TTL
    /// produces an already-expired token, which tests use to simulate
    /// clock fast-forward.
    pub fn issue_access_with_ttl(
        &self,
        user_id: Uuid,
        role: Role,
        ttl_secs: i64,
    ) -> anyhow::Result<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role,
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("failed to sign access token: {e}"))
    }

    /// Verify signature then expiry. The two failure kinds stay
    /// distinct; a tampered token is `Invalid` regardless of expiry.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        // Zero leeway so expiry is exact rather than fuzzy.
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<AccessClaims>(token, &self.keys.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                _ => Err(TokenError::Invalid),
            },
        }
    }

    /// Access token lifetime in seconds, reported to clients as `expires_in`.
    #[inline]
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }
}
