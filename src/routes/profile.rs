// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes for the caller's own profile.
//!
//! None of these take a user ID: the profile is always the one owned by
//! the authenticated user.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{Achievement, NewAchievement, Profile, ProfileUpdate};
use crate::routes::ApiJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use std::sync::Arc;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", post(upsert_profile))
        .route("/api/profile/me", get(get_profile).delete(delete_profile))
        .route("/api/profile/me/achievements", post(add_achievement))
        .route(
            "/api/profile/me/achievements/{achievement_id}",
            delete(remove_achievement),
        )
}

/// Create or update the caller's profile.
async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>> {
    let profile = state.profiles.upsert_profile(&user.user_id, update).await?;
    Ok(Json(profile))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Profile>> {
    Ok(Json(state.profiles.get_own_profile(&user.user_id).await?))
}

async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<StatusCode> {
    state.profiles.delete_own_profile(&user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Achievements ────────────────────────────────────────────

async fn add_achievement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(request): ApiJson<NewAchievement>,
) -> Result<(StatusCode, Json<Achievement>)> {
    let achievement = state
        .profiles
        .add_achievement(&user.user_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(achievement)))
}

async fn remove_achievement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(achievement_id): Path<String>,
) -> Result<StatusCode> {
    state
        .profiles
        .remove_achievement(&user.user_id, &achievement_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
