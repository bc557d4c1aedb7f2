// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, Response},
};
use khelo_api::config::Config;
use khelo_api::db::{Database, FirestoreDb, MemoryDb};
use khelo_api::models::Role;
use khelo_api::routes::create_router;
use khelo_api::AppState;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = Database::Memory(MemoryDb::new());
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));

    (create_router(state.clone()), state)
}

/// Build a request with an optional bearer token and JSON body.
#[allow(dead_code)]
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign up through the API and return `(token, user_id)`.
#[allow(dead_code)]
pub async fn signup(app: &axum::Router, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/signup",
            None,
            Some(serde_json::json!({
                "name": "Test Athlete",
                "email": email,
                "password": "correct-horse-battery",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 201, "signup failed for {}", email);

    let body = body_json(response).await;
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

/// Sign up and then give the account `role` directly in the store.
///
/// The token keeps its original role claim; the server reads the role
/// from the stored user.
#[allow(dead_code)]
pub async fn signup_with_role(
    app: &axum::Router,
    state: &AppState,
    email: &str,
    role: Role,
) -> (String, String) {
    let (token, user_id) = signup(app, email).await;
    state.accounts.set_role(&user_id, role).await.unwrap();
    (token, user_id)
}
