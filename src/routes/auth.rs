// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account and session routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::UserResponse;
use crate::routes::ApiJson;
use crate::services::{
    AuthResponse, ChangePasswordRequest, LoginRequest, SignupRequest, UpdateMeRequest,
};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use std::sync::Arc;

/// Routes that issue or drop a session; no token required.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

/// Routes for the signed-in user's own account.
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/auth/me",
            get(get_me).patch(update_me).delete(delete_me),
        )
        .route("/api/auth/password", patch(change_password))
}

/// Create an account and return a session for it.
async fn signup(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let session = state.accounts.signup(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    Ok(Json(state.accounts.login(request).await?))
}

/// Tokens are stateless; the client drops its copy.
async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Get the current user, always read fresh from the store.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state.accounts.get_user(&user.user_id).await?;
    Ok(Json(user.into()))
}

async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<UpdateMeRequest>,
) -> Result<Json<UserResponse>> {
    let user = state.accounts.update_me(&user.user_id, request).await?;
    Ok(Json(user.into()))
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    state
        .accounts
        .change_password(&user.user_id, request)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete the account and its profile.
async fn delete_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.accounts.delete_account(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
