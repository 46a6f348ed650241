//! The session agent
//!
//! Request contract:
//! 1. attach `Authorization: Bearer <access>` when a pair is stored;
//! 2. send;
//! 3. if the response is a 401 whose body code is exactly
//!    `TOKEN_EXPIRED`, run one refresh and retry the original request
//!    once with the new access token;
//! 4. everything else is surfaced unmodified. Never more than one
//!    recovery per call.
//!
//! Concurrent expiries coalesce: a mutex guards the refresh path, and
//! a caller that waited on it re-reads the store before refreshing.
//! If the pair changed while waiting, someone else already rotated
//! and the presented secret would be dead; the late caller adopts the
//! winner's pair instead of spuriously ending the session.

use crate::error::ClientError;
use crate::store::{MemoryTokenStore, TokenPair, TokenStore};
use jobdeck_shared::{
    AuthTokens, ChangePasswordRequest, LoginRequest, ProfileResponse, SessionResponse, UserSummary,
};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Error body shape produced by the server:
/// `{"error":{"code":"...","message":"..."}}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Holds the session and speaks to the JobDeck API.
///
/// Cloning shares the token store and the refresh gate, so clones
/// coalesce their refreshes with the original.
#[derive(Clone)]
pub struct SessionAgent {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresh_gate: Arc<Mutex<()>>,
}

impl SessionAgent {
    /// Agent with an in-memory token store.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_store(base_url, Arc::new(MemoryTokenStore::new()))
    }

    /// Agent with a caller-provided token store.
    pub fn with_store(base_url: impl Into<String>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    /// The token store (primarily for inspection in tests and shells).
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Authenticate and store the minted pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserSummary, ClientError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let value = self.request(Method::POST, "/api/auth/login", Some(&body)).await?;
        let session: SessionResponse = serde_json::from_value(value)?;

        self.store.set(TokenPair {
            access: session.tokens.access_token,
            refresh: session.tokens.refresh_token,
        });
        Ok(session.user)
    }

    /// End the session. Best-effort on the server side; local state is
    /// cleared no matter what the server said.
    pub async fn logout(&self) -> Result<(), ClientError> {
        if let Some(pair) = self.store.get() {
            let body = serde_json::json!({ "refresh_token": pair.refresh });
            // An already-dead token or an unreachable server changes
            // nothing about the local end state.
            let _ = self.request(Method::POST, "/api/auth/logout", Some(&body)).await;
        }
        self.store.clear();
        Ok(())
    }

    /// Change the account password. The server revokes every other
    /// session; this one keeps its current pair until expiry.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let body = serde_json::to_value(ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        })?;

        self.request(Method::POST, "/api/auth/change-password", Some(&body))
            .await?;
        Ok(())
    }

    /// Profile of the authenticated account.
    pub async fn me(&self) -> Result<ProfileResponse, ClientError> {
        let value = self.request(Method::GET, "/api/auth/me", None).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// GET a protected resource.
    pub async fn get(&self, path: &str) -> Result<serde_json::Value, ClientError> {
        self.request(Method::GET, path, None).await
    }

    /// POST to a protected resource.
    pub async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ClientError> {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Send a request with the retry-once-after-refresh policy.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ClientError> {
        let access = self.store.get().map(|pair| pair.access);

        let response = self.execute(&method, path, body, access.as_deref()).await?;
        if response.status().is_success() {
            return read_json(response).await;
        }

        let status = response.status();
        let (code, message) = read_error(response).await;

        // Only the distinguished expiry signal triggers recovery, and
        // only when we actually presented a token.
        if status == StatusCode::UNAUTHORIZED && code == "TOKEN_EXPIRED" {
            if let Some(observed) = access {
                let new_access = self.refresh_after_expiry(&observed).await?;
                let retry = self.execute(&method, path, body, Some(&new_access)).await?;
                if retry.status().is_success() {
                    return read_json(retry).await;
                }
                let status = retry.status();
                let (code, message) = read_error(retry).await;
                return Err(ClientError::Api {
                    status,
                    code,
                    message,
                });
            }
        }

        Err(ClientError::Api {
            status,
            code,
            message,
        })
    }

    async fn execute(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
        access: Option<&str>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));
        if let Some(token) = access {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request.send().await
    }

    /// One refresh per expiry burst. `observed_access` is the token
    /// this caller presented when it saw the expiry; if the store no
    /// longer holds it after acquiring the gate, a concurrent caller
    /// already rotated and its pair is adopted as-is.
    async fn refresh_after_expiry(&self, observed_access: &str) -> Result<String, ClientError> {
        let _guard = self.refresh_gate.lock().await;

        let refresh_secret = match self.store.get() {
            Some(pair) if pair.access != observed_access => {
                debug!("adopting refresh performed by a concurrent caller");
                return Ok(pair.access);
            }
            Some(pair) => pair.refresh,
            None => return Err(ClientError::SessionExpired),
        };

        let body = serde_json::json!({ "refresh_token": refresh_secret });
        let response = self
            .execute(&Method::POST, "/api/auth/refresh", Some(&body), None)
            .await;

        let tokens: AuthTokens = match response {
            Ok(response) if response.status().is_success() => {
                match response.json().await {
                    Ok(tokens) => tokens,
                    Err(_) => return self.end_session(),
                }
            }
            // Rejected or unreachable: the session is over either way.
            _ => return self.end_session(),
        };

        let access = tokens.access_token.clone();
        self.store.set(TokenPair {
            access: tokens.access_token,
            refresh: tokens.refresh_token,
        });
        debug!("session refreshed");
        Ok(access)
    }

    fn end_session<T>(&self) -> Result<T, ClientError> {
        self.store.clear();
        Err(ClientError::SessionExpired)
    }
}

async fn read_json(response: reqwest::Response) -> Result<serde_json::Value, ClientError> {
    if response.content_length() == Some(0) {
        return Ok(serde_json::Value::Null);
    }
    Ok(response.json().await?)
}

/// Pull the machine-readable code out of an error body, tolerating
/// bodies that are not the standard shape.
async fn read_error(response: reqwest::Response) -> (String, String) {
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.error.code, body.error.message),
        Err(_) => ("UNKNOWN".to_string(), "Request failed".to_string()),
    }
}
