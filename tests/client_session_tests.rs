// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session bridge tests against a live server on a local port.

use khelo_api::client::{ApiClient, ClientError, MemorySessionStore, SessionStore};
use khelo_api::models::{ProfileUpdate, Role};
use khelo_api::services::{LoginRequest, SignupRequest};
use khelo_api::AppState;
use std::sync::Arc;

mod common;

/// Serve the test app and return its base URL and state.
async fn spawn_server() -> (String, Arc<AppState>) {
    let (app, state) = common::create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        name: "Client User".to_string(),
        email: email.to_string(),
        password: "correct-horse-battery".to_string(),
        sport: None,
    }
}

#[tokio::test]
async fn test_signup_stores_session_and_me_uses_it() {
    let (base_url, _) = spawn_server().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(base_url, store.clone());

    let session = client.signup(&signup_request("client@example.com")).await.unwrap();
    assert_eq!(store.token().as_deref(), Some(session.token.as_str()));

    client.guard("/dashboard").unwrap();
    let me = client.me().await.unwrap();
    assert_eq!(me.id, session.user.id);
    assert_eq!(me.role, Role::Athlete);
}

#[tokio::test]
async fn test_profile_roundtrip_through_client() {
    let (base_url, _) = spawn_server().await;
    let client = ApiClient::new(base_url, Arc::new(MemorySessionStore::new()));
    client.signup(&signup_request("profile@example.com")).await.unwrap();

    assert!(client.my_profile().await.unwrap().is_none());

    let saved = client
        .upsert_profile(&ProfileUpdate {
            sport: Some("Volleyball".to_string()),
            location: Some("Goa".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(saved.sport, "Volleyball");

    let fetched = client.my_profile().await.unwrap().unwrap();
    assert_eq!(fetched, saved);
}

#[tokio::test]
async fn test_rejected_session_clears_and_redirects() {
    let (base_url, state) = spawn_server().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(base_url, store.clone());

    let session = client.signup(&signup_request("revoked@example.com")).await.unwrap();
    client.guard("/profile/edit").unwrap();

    // Account disappears server-side; the token is now useless.
    state.accounts.delete_account(&session.user.id).await.unwrap();

    match client.me().await {
        Err(ClientError::LoginRequired(redirect)) => {
            assert_eq!(redirect.url(), "/login?next=%2Fprofile%2Fedit");
        }
        other => panic!("expected LoginRequired, got {other:?}"),
    }
    assert!(store.token().is_none());

    // No session now, so the guard redirects without a network call.
    assert!(matches!(
        client.guard("/profile/edit"),
        Err(ClientError::LoginRequired(_))
    ));
}

#[tokio::test]
async fn test_bad_login_is_api_error_not_redirect() {
    let (base_url, _) = spawn_server().await;
    let store = Arc::new(MemorySessionStore::new());
    let client = ApiClient::new(base_url, store.clone());
    client.signup(&signup_request("login@example.com")).await.unwrap();
    client.logout().await;
    assert!(store.token().is_none());

    let err = client
        .login(&LoginRequest {
            email: "login@example.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, kind, .. } => {
            assert_eq!(status, 401);
            assert_eq!(kind, "unauthorized");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(store.token().is_none());

    client
        .login(&LoginRequest {
            email: "login@example.com".to_string(),
            password: "correct-horse-battery".to_string(),
        })
        .await
        .unwrap();
    assert!(store.token().is_some());
}
