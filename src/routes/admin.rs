// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin-only routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::{AdminOnly, Authorized};
use crate::models::{Role, UserResponse};
use crate::routes::ApiJson;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::put,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/users/{user_id}/role", put(set_role))
}

#[derive(Debug, Deserialize)]
struct RoleUpdate {
    role: Role,
}

/// Assign a role to another user.
async fn set_role(
    State(state): State<Arc<AppState>>,
    admin: Authorized<AdminOnly>,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<RoleUpdate>,
) -> Result<Json<UserResponse>> {
    // Keeps at least the acting admin in place.
    if admin.user.user_id == user_id {
        return Err(AppError::Validation(
            "Admins cannot change their own role".to_string(),
        ));
    }

    let user = state.accounts.set_role(&user_id, update.role).await?;
    tracing::info!(
        admin_id = %admin.user.user_id,
        user_id = %user.id,
        role = %user.role,
        "Role assigned"
    );
    Ok(Json(user.into()))
}
