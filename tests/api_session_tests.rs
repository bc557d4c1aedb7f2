// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signup, login and account self-service tests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, request};

#[tokio::test]
async fn test_signup_returns_token_and_public_user() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Asha Patil",
                "email": "asha@example.com",
                "password": "correct-horse-battery",
                "sport": "Kabaddi",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert!(body["token"].as_str().unwrap().len() > 20);
    assert!(body["expires_in"].as_i64().unwrap() > 0);
    assert_eq!(body["user"]["name"], "Asha Patil");
    assert_eq!(body["user"]["sport"], "Kabaddi");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_signup_ignores_client_supplied_role() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Sneaky",
                "email": "sneaky@example.com",
                "password": "correct-horse-battery",
                "role": "admin",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], "athlete");
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
    let (app, _) = common::create_test_app();
    common::signup(&app, "dup@example.com").await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({
                "name": "Second",
                "email": "  DUP@Example.com ",
                "password": "another-long-password",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert_eq!(body["error"], "conflict");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_signups_same_email() {
    let (app, _) = common::create_test_app();

    let attempts: Vec<_> = (0..8)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                app.oneshot(request(
                    "POST",
                    "/api/auth/signup",
                    None,
                    Some(json!({
                        "name": format!("Racer {}", i),
                        "email": "race@example.com",
                        "password": "correct-horse-battery",
                    })),
                ))
                .await
                .unwrap()
                .status()
            })
        })
        .collect();

    let mut created = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            StatusCode::CREATED => created += 1,
            status => assert_eq!(status, StatusCode::CONFLICT),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_signup_validation_errors() {
    let (app, _) = common::create_test_app();

    let cases = [
        json!({ "name": "A", "email": "not-an-email", "password": "long-enough-pw" }),
        json!({ "name": "A", "email": "a@example.com", "password": "short" }),
        json!({ "name": "   ", "email": "a@example.com", "password": "long-enough-pw" }),
        json!({ "email": "a@example.com", "password": "long-enough-pw" }),
    ];

    for case in cases {
        let response = app
            .clone()
            .oneshot(request("POST", "/api/auth/signup", None, Some(case.clone())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "case: {}", case);
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_signup_malformed_json() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/signup")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"name\": "))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_success_case_insensitive_email() {
    let (app, _) = common::create_test_app();
    let (_, user_id) = common::signup(&app, "Login@Example.com").await;

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "login@example.COM", "password": "correct-horse-battery" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], user_id.as_str());
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _) = common::create_test_app();
    common::signup(&app, "known@example.com").await;

    let wrong_password = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "known@example.com", "password": "not-the-password" })),
        ))
        .await
        .unwrap();
    let unknown_email = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "unknown@example.com", "password": "not-the-password" })),
        ))
        .await
        .unwrap();

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let a = axum::body::to_bytes(wrong_password.into_body(), usize::MAX)
        .await
        .unwrap();
    let b = axum::body::to_bytes(unknown_email.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn test_logout_is_no_content() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(request("POST", "/api/auth/logout", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_update_me_and_change_password() {
    let (app, _) = common::create_test_app();
    let (token, _) = common::signup(&app, "self@example.com").await;

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            "/api/auth/me",
            Some(&token),
            Some(json!({ "name": "Renamed", "sport": "Hockey" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["sport"], "Hockey");

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            "/api/auth/password",
            Some(&token),
            Some(json!({
                "current_password": "wrong-current",
                "new_password": "a-brand-new-password",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(request(
            "PATCH",
            "/api/auth/password",
            Some(&token),
            Some(json!({
                "current_password": "correct-horse-battery",
                "new_password": "a-brand-new-password",
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "self@example.com", "password": "a-brand-new-password" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
