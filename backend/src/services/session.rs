//! Session lifecycle: login, refresh rotation, logout, password change
//!
//! The one component that touches both the credential/token
//! primitives and the stores. Refresh is the delicate part: the
//! presented secret is consumed (deleted) before anything new is
//! issued, and the delete's affected-row count decides races between
//! concurrent presentations of the same secret. A raw refresh secret
//! can therefore never yield two live sessions.
//!
//! Nothing here logs passwords or refresh secrets, only outcomes.

use crate::auth::{refresh, PasswordService};
use crate::error::ApiError;
use crate::repositories::{RefreshTokenStore, UserRecord, UserRepository};
use crate::state::AppState;
use chrono::{Duration, Utc};
use jobdeck_shared::{
    AuthCode, AuthTokens, ProfileResponse, RegisterRequest, Role, SessionResponse, UserSummary,
};
use once_cell::sync::Lazy;
use tracing::{info, warn};
use uuid::Uuid;
use validator::ValidateEmail;

const MIN_PASSWORD_LEN: usize = 8;

/// Digest burned on lookups that miss, so login latency does not
/// reveal whether an email has an account.
static TIMING_EQUALIZER_HASH: Lazy<String> = Lazy::new(|| {
    PasswordService::hash("timing-equalizer").expect("argon2 hashing cannot fail on startup")
});

/// Session lifecycle operations
pub struct SessionService;

impl SessionService {
    /// Register a new account and log it in.
    pub async fn register(
        state: &AppState,
        req: &RegisterRequest,
    ) -> Result<SessionResponse, ApiError> {
        let email = normalize_email(&req.email);

        if !email.validate_email() {
            return Err(ApiError::Validation("Invalid email format".to_string()));
        }
        if !req.role.can_self_register() {
            return Err(ApiError::BadRequest(format!(
                "Cannot self-register as {}. Allowed roles: contractor, inspector",
                req.role
            )));
        }
        if req.password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Auth(AuthCode::WeakPassword));
        }
        if UserRepository::email_exists(&state.db, &email)
            .await
            .map_err(ApiError::Internal)?
        {
            return Err(ApiError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        // Hash on the blocking pool; argon2 is CPU-bound.
        let password_hash = PasswordService::hash_async(req.password.clone())
            .await
            .map_err(ApiError::Internal)?;

        let user = UserRepository::create(
            &state.db,
            &email,
            &password_hash,
            &req.name,
            req.role,
            req.phone.as_deref(),
        )
        .await
        .map_err(ApiError::Internal)?;

        info!(user_id = %user.id, role = %req.role, "account registered");

        let tokens = Self::mint_pair(state, user.id, req.role).await?;
        Ok(SessionResponse {
            tokens,
            user: summary(&user)?,
        })
    }

    /// Verify credentials and open a session.
    ///
    /// A failed lookup still runs a full argon2 verification against
    /// a fixed digest, so the response time does not distinguish
    /// "unknown email" from "wrong password".
    pub async fn login(
        state: &AppState,
        email: &str,
        password: &str,
    ) -> Result<SessionResponse, ApiError> {
        let email = normalize_email(email);
        let user = UserRepository::find_by_email(&state.db, &email)
            .await
            .map_err(ApiError::Internal)?;

        let Some(user) = user else {
            let _ = PasswordService::verify_async(
                password.to_string(),
                TIMING_EQUALIZER_HASH.clone(),
            )
            .await;
            warn!(outcome = "bad_credentials", "login rejected");
            return Err(ApiError::Auth(AuthCode::BadCredentials));
        };

        let valid =
            PasswordService::verify_async(password.to_string(), user.password_hash.clone())
                .await
                .map_err(ApiError::Internal)?;
        if !valid {
            warn!(outcome = "bad_credentials", "login rejected");
            return Err(ApiError::Auth(AuthCode::BadCredentials));
        }

        // Only after the password checked out: a distinct code here
        // leaks nothing to a caller without valid credentials.
        if !user.is_active {
            warn!(user_id = %user.id, outcome = "account_inactive", "login rejected");
            return Err(ApiError::Auth(AuthCode::AccountInactive));
        }

        let role = user.role().map_err(ApiError::Internal)?;
        let tokens = Self::mint_pair(state, user.id, role).await?;

        info!(user_id = %user.id, "login succeeded");
        Ok(SessionResponse {
            tokens,
            user: summary(&user)?,
        })
    }

    /// Rotate a refresh secret into a new access/refresh pair.
    ///
    /// Order is load-bearing:
    /// 1. look up the live record for the digest;
    /// 2. delete it, and treat an affected count of 0 as losing a
    ///    race to a concurrent presentation (fail closed);
    /// 3. re-check the account is still active;
    /// 4. only then mint and persist the replacement pair.
    ///
    /// The presented secret is permanently dead after any path
    /// through here.
    pub async fn refresh(state: &AppState, raw_secret: &str) -> Result<AuthTokens, ApiError> {
        let digest = refresh::digest(raw_secret);

        let record = RefreshTokenStore::find_live(&state.db, &digest)
            .await
            .map_err(ApiError::Internal)?;
        let Some(record) = record else {
            warn!(outcome = "invalid_refresh", "refresh rejected");
            return Err(ApiError::Auth(AuthCode::InvalidRefresh));
        };

        // Consume before reissue. Whichever concurrent caller's
        // delete removes the row wins; everyone else sees 0 here.
        let deleted = RefreshTokenStore::delete_by_digest(&state.db, &digest)
            .await
            .map_err(ApiError::Internal)?;
        if deleted == 0 {
            warn!(
                user_id = %record.user_id,
                outcome = "invalid_refresh",
                "refresh lost rotation race"
            );
            return Err(ApiError::Auth(AuthCode::InvalidRefresh));
        }

        let user = UserRepository::find_by_id(&state.db, record.user_id)
            .await
            .map_err(ApiError::Internal)?;
        let active = user.as_ref().map(|u| u.is_active).unwrap_or(false);
        let Some(user) = user.filter(|_| active) else {
            // The delete above already revoked the token, which is
            // the end state we want for a deactivated account.
            warn!(user_id = %record.user_id, outcome = "account_inactive", "refresh rejected");
            return Err(ApiError::Auth(AuthCode::AccountInactive));
        };

        let role = user.role().map_err(ApiError::Internal)?;
        let tokens = Self::mint_pair(state, user.id, role).await?;

        info!(user_id = %user.id, "refresh rotated");
        Ok(tokens)
    }

    /// Close a session. Deleting an already-gone record is fine; the
    /// end state (no session) is identical, so logout never fails
    /// from the caller's perspective.
    pub async fn logout(state: &AppState, raw_secret: Option<&str>) -> Result<(), ApiError> {
        if let Some(raw) = raw_secret {
            let digest = refresh::digest(raw);
            let deleted = RefreshTokenStore::delete_by_digest(&state.db, &digest)
                .await
                .map_err(ApiError::Internal)?;
            info!(deleted, "logout");
        } else {
            info!(deleted = 0u64, "logout without refresh token");
        }
        Ok(())
    }

    /// Change the account password and revoke every outstanding
    /// refresh token, so stale sessions on other devices cannot
    /// silently continue under the old credential.
    pub async fn change_password(
        state: &AppState,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(ApiError::Auth(AuthCode::WeakPassword));
        }

        let user = UserRepository::find_by_id(&state.db, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let valid = PasswordService::verify_async(
            current_password.to_string(),
            user.password_hash.clone(),
        )
        .await
        .map_err(ApiError::Internal)?;
        if !valid {
            warn!(user_id = %user_id, outcome = "bad_credentials", "password change rejected");
            return Err(ApiError::Auth(AuthCode::BadCredentials));
        }

        let new_hash = PasswordService::hash_async(new_password.to_string())
            .await
            .map_err(ApiError::Internal)?;
        UserRepository::update_password(&state.db, user_id, &new_hash)
            .await
            .map_err(ApiError::Internal)?;

        let revoked = RefreshTokenStore::delete_all_for(&state.db, user_id)
            .await
            .map_err(ApiError::Internal)?;

        info!(user_id = %user_id, revoked, "password changed, sessions revoked");
        Ok(())
    }

    /// Profile of the authenticated account.
    pub async fn profile(state: &AppState, user_id: Uuid) -> Result<ProfileResponse, ApiError> {
        let user = UserRepository::find_by_id(&state.db, user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let role = user.role().map_err(ApiError::Internal)?;
        Ok(ProfileResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role,
            role_key: role.role_key().to_string(),
            phone: user.phone,
            created_at: user.created_at,
        })
    }

    /// Issue an access token, generate and persist a refresh secret,
    /// and hand both back. The raw secret appears in the return value
    /// and nowhere else.
    async fn mint_pair(
        state: &AppState,
        user_id: Uuid,
        role: Role,
    ) -> Result<AuthTokens, ApiError> {
        let access_token = state
            .tokens()
            .issue_access(user_id, role)
            .map_err(ApiError::Internal)?;

        let secret = refresh::generate_secret();
        let digest = refresh::digest(&secret);
        let expires_at = Utc::now() + Duration::seconds(state.config.auth.refresh_ttl_secs);

        RefreshTokenStore::put(&state.db, user_id, &digest, expires_at)
            .await
            .map_err(ApiError::Internal)?;

        Ok(AuthTokens {
            access_token,
            refresh_token: secret,
            token_type: "Bearer".to_string(),
            expires_in: state.tokens().access_ttl_secs(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn summary(user: &UserRecord) -> Result<UserSummary, ApiError> {
    let role = user.role().map_err(ApiError::Internal)?;
    Ok(UserSummary {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        role,
        role_key: role.role_key().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_normalization() {
        assert_eq!(normalize_email("  Pat@Example.COM "), "pat@example.com");
    }

    // Login/refresh/logout/change-password flows are covered by the
    // DB-backed integration tests in tests/auth_integration_test.rs.
}
