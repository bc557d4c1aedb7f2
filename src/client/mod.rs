// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session-carrying API client.
//!
//! Holds the token returned by signup/login, attaches it to protected
//! calls, and turns a 401 into a login redirect after dropping the
//! session.

pub mod api;
pub mod session;

pub use api::{ApiClient, ClientError};
pub use session::{LoginRedirect, MemorySessionStore, Session, SessionStore, LOGIN_PATH};
