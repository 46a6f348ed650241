//! Authentication routes
//!
//! Login, register, refresh, logout, change-password, and the
//! profile endpoint. Refresh secrets travel only in request bodies.

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::services::SessionService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use jobdeck_shared::{
    AuthTokens, ChangePasswordRequest, LoginRequest, LogoutRequest, ProfileResponse,
    RefreshRequest, RegisterRequest, SessionResponse,
};
use serde_json::json;

/// Create auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

/// POST /api/auth/register
///
/// Self-registration (contractor and inspector roles only), with
/// auto-login: returns the same token pair as login.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = SessionService::register(&state, &req).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = SessionService::login(&state, &req.email, &req.password).await?;
    Ok(Json(session))
}

/// POST /api/auth/refresh
///
/// Rotates the presented refresh secret into a new pair. The old
/// secret is dead afterwards whether or not this call succeeds.
async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<AuthTokens>> {
    let tokens = SessionService::refresh(&state, &req.refresh_token).await?;
    Ok(Json(tokens))
}

/// POST /api/auth/logout (bearer required)
///
/// Always 200: deleting an already-gone session reaches the same end
/// state.
async fn logout(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    SessionService::logout(&state, req.refresh_token.as_deref()).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// POST /api/auth/change-password (bearer required)
///
/// Revokes every outstanding refresh token for the account.
async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    SessionService::change_password(
        &state,
        auth.user_id,
        &req.current_password,
        &req.new_password,
    )
    .await?;
    Ok(Json(json!({ "message": "Password changed successfully" })))
}

/// GET /api/auth/me (bearer required)
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<Json<ProfileResponse>> {
    let profile = SessionService::profile(&state, auth.user_id).await?;
    Ok(Json(profile))
}
