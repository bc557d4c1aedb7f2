// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP client for the Khelo API.

use crate::client::session::{LoginRedirect, Session, SessionStore};
use crate::models::{Profile, ProfileUpdate, UserResponse};
use crate::services::{AuthResponse, LoginRequest, SignupRequest};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{Arc, RwLock};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No usable session; send the user to the login page.
    #[error("login required")]
    LoginRequired(LoginRedirect),

    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Khelo API client.
///
/// Every protected call reads the token from the session store at call
/// time; nothing else in the client holds it.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<dyn SessionStore>,
    /// Page the user is on, used as the post-login destination.
    location: Arc<RwLock<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<dyn SessionStore>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            location: Arc::new(RwLock::new("/".to_string())),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn login_required(&self) -> ClientError {
        let location = self
            .location
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ClientError::LoginRequired(LoginRedirect::to(&location))
    }

    /// Enter a page that needs a session.
    ///
    /// Records `destination` for any later login redirect, and fails
    /// straight away if there is no session to use.
    pub fn guard(&self, destination: &str) -> Result<(), ClientError> {
        *self
            .location
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = destination.to_string();

        if self.session.token().is_none() {
            return Err(self.login_required());
        }
        Ok(())
    }

    // ─── Session ─────────────────────────────────────────────────

    pub async fn signup(&self, request: &SignupRequest) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(request)
            .send()
            .await?;
        self.start_session(response).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Session, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(request)
            .send()
            .await?;
        self.start_session(response).await
    }

    async fn start_session(&self, response: Response) -> Result<Session, ClientError> {
        let auth: AuthResponse = check_response_json(response).await?;
        let session = Session {
            token: auth.token,
            user: auth.user,
        };
        self.session.set_session(session.clone());
        tracing::debug!(user_id = %session.user.id, "Session started");
        Ok(session)
    }

    /// Drop the local session. The server call is best-effort.
    pub async fn logout(&self) {
        self.session.clear_session();
        if let Err(e) = self.http.post(self.url("/api/auth/logout")).send().await {
            tracing::debug!(error = %e, "Logout request failed");
        }
    }

    // ─── Protected Calls ─────────────────────────────────────────

    /// Send with the stored bearer token; a 401 ends the session.
    async fn send_protected(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let token = self.session.token().ok_or_else(|| self.login_required())?;
        let response = request.bearer_auth(token).send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::info!("Session rejected by server, clearing");
            self.session.clear_session();
            return Err(self.login_required());
        }
        Ok(response)
    }

    /// Current user, as the server sees it.
    pub async fn me(&self) -> Result<UserResponse, ClientError> {
        let response = self
            .send_protected(self.http.get(self.url("/api/auth/me")))
            .await?;
        check_response_json(response).await
    }

    pub async fn upsert_profile(&self, update: &ProfileUpdate) -> Result<Profile, ClientError> {
        let response = self
            .send_protected(self.http.post(self.url("/api/profile")).json(update))
            .await?;
        check_response_json(response).await
    }

    /// The caller's profile, or `None` if they have not created one.
    pub async fn my_profile(&self) -> Result<Option<Profile>, ClientError> {
        let response = self
            .send_protected(self.http.get(self.url("/api/profile/me")))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        check_response_json(response).await.map(Some)
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let (kind, message) = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(e) => (e.error, e.message),
            Err(_) => ("unknown".to_string(), body),
        };
        return Err(ClientError::Api {
            status: status.as_u16(),
            kind,
            message,
        });
    }

    Ok(response.json().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemorySessionStore;

    #[tokio::test]
    async fn test_guard_without_session_redirects() {
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemorySessionStore::new()));

        let err = client.guard("/profile/edit").unwrap_err();
        match err {
            ClientError::LoginRequired(redirect) => {
                assert_eq!(redirect.url(), "/login?next=%2Fprofile%2Fedit");
            }
            other => panic!("expected LoginRequired, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_protected_call_without_session_skips_network() {
        // Port 9 would refuse; LoginRequired proves no request was made.
        let client = ApiClient::new("http://127.0.0.1:9", Arc::new(MemorySessionStore::new()));
        assert!(matches!(
            client.me().await,
            Err(ClientError::LoginRequired(_))
        ));
    }
}
