// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side session state.

use crate::models::UserResponse;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Login entry point the client redirects to when a session is missing.
pub const LOGIN_PATH: &str = "/login";

/// What the client keeps after signup or login.
///
/// `user` is only a display hint; identity is re-read from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserResponse,
}

/// Storage for the current session. The rest of the client only goes
/// through these three calls.
pub trait SessionStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn set_session(&self, session: Session);
    fn clear_session(&self);
}

/// Process-local session storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored session, if any.
    pub fn current(&self) -> Option<Session> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.token.clone())
    }

    fn set_session(&self, session: Session) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
    }

    fn clear_session(&self) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Where to send the user to log in, and where to return afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    pub next: Option<String>,
}

impl LoginRedirect {
    /// Redirect that returns to `destination` after login.
    ///
    /// The root and the login page itself are not worth returning to.
    pub fn to(destination: &str) -> Self {
        let next = Some(destination)
            .filter(|d| !d.is_empty() && *d != "/" && !d.starts_with(LOGIN_PATH))
            .map(str::to_string);
        Self { next }
    }

    /// Login page URL, e.g. `/login?next=%2Fprofile%2Fedit`.
    pub fn url(&self) -> String {
        match &self.next {
            Some(next) => format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next)),
            None => LOGIN_PATH.to_string(),
        }
    }
}
