// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Player browse routes, plus the coach/admin routes that act on another
//! player's profile.

use crate::db::ProfileQuery;
use crate::error::{AppError, Result};
use crate::middleware::auth::{AuthUser, Authorized, Staff};
use crate::models::{Achievement, Profile};
use crate::routes::ApiJson;
use crate::services::{PlayerPage, PlayerView};
use crate::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Browse routes. Optional authentication is applied in routes/mod.rs.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/players", get(browse_players))
        .route("/api/players/{user_id}", get(get_player))
}

/// Coach/admin routes. Require authentication, then a staff role.
pub fn staff_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/players/{user_id}/stats", put(set_stats))
        .route(
            "/api/players/{user_id}/achievements/{achievement_id}/verify",
            post(verify_achievement),
        )
}

async fn browse_players(
    State(state): State<Arc<AppState>>,
    viewer: Option<AuthUser>,
    query: std::result::Result<Query<ProfileQuery>, QueryRejection>,
) -> Result<Json<PlayerPage>> {
    let Query(query) = query.map_err(|e| AppError::Validation(e.body_text()))?;

    let page = state.profiles.browse(query).await?;
    tracing::debug!(
        viewer = viewer.as_ref().map(|v| v.user_id.as_str()),
        results = page.players.len(),
        total = page.total,
        "Players browsed"
    );
    Ok(Json(page))
}

async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<PlayerView>> {
    Ok(Json(state.profiles.get_player(&user_id).await?))
}

// ─── Staff ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct StatsUpdate {
    stats: BTreeMap<String, Value>,
}

/// Replace a player's stats.
async fn set_stats(
    State(state): State<Arc<AppState>>,
    staff: Authorized<Staff>,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<StatsUpdate>,
) -> Result<Json<Profile>> {
    let profile = state
        .profiles
        .set_stats(&user_id, update.stats, &staff.user.user_id)
        .await?;
    Ok(Json(profile))
}

async fn verify_achievement(
    State(state): State<Arc<AppState>>,
    staff: Authorized<Staff>,
    Path((user_id, achievement_id)): Path<(String, String)>,
) -> Result<Json<Achievement>> {
    let achievement = state
        .profiles
        .verify_achievement(&user_id, &achievement_id, &staff.user.user_id)
        .await?;
    Ok(Json(achievement))
}
