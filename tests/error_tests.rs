// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::response::IntoResponse;
use khelo_api::error::AppError;

async fn body_of(err: AppError) -> (u16, serde_json::Value) {
    let response = err.into_response();
    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_error_body_shape() {
    let (status, body) = body_of(AppError::Conflict("email taken".to_string())).await;
    assert_eq!(status, 409);
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "email taken");
}

#[tokio::test]
async fn test_internal_detail_not_exposed() {
    let (status, body) = body_of(AppError::Database(
        "connection refused to 10.0.0.3:8681".to_string(),
    ))
    .await;
    assert_eq!(status, 500);
    assert_eq!(body["error"], "internal_error");
    assert!(!body["message"].as_str().unwrap().contains("10.0.0.3"));

    let (status, body) =
        body_of(AppError::Internal(anyhow::anyhow!("argon2 params exploded"))).await;
    assert_eq!(status, 500);
    assert!(!body["message"].as_str().unwrap().contains("argon2"));
}

#[tokio::test]
async fn test_unauthorized_message_is_generic() {
    let (status, body) = body_of(AppError::Unauthorized).await;
    assert_eq!(status, 401);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Not authorized");
}
