// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-token authentication middleware and role guards.

use crate::error::{AppError, Result};
use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    typed_header::TypedHeaderRejection,
    TypedHeader,
};
use std::convert::Infallible;
use std::marker::PhantomData;
use std::sync::Arc;

/// Authenticated user attached to the request by [`require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: String,
    /// Role from the stored user record, not from the token.
    pub role: Role,
}

/// Resolve a bearer token to a live user.
///
/// The token must verify and its subject must still exist, so a token
/// outliving its account is rejected.
async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser> {
    let identity = state.tokens.verify(token).map_err(|e| {
        tracing::debug!(reason = %e, "Rejected bearer token");
        AppError::Unauthorized
    })?;

    let user = state.db.get_user(&identity.user_id).await?.ok_or_else(|| {
        tracing::warn!(user_id = %identity.user_id, "Valid token for deleted user");
        AppError::Unauthorized
    })?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

/// Middleware that requires a valid bearer token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    bearer: std::result::Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::Unauthorized)?;

    let auth_user = authenticate(&state, bearer.token()).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware for public routes that can use an identity if one is sent.
///
/// A missing or bad token leaves the request anonymous instead of failing.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    bearer: std::result::Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Ok(TypedHeader(Authorization(bearer))) = bearer {
        match authenticate(&state, bearer.token()).await {
            Ok(auth_user) => {
                request.extensions_mut().insert(auth_user);
            }
            Err(AppError::Unauthorized) => {}
            Err(e) => tracing::warn!(error = %e, "Optional authentication failed"),
        }
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Option<Self>, Infallible> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

// ─── Role Guards ─────────────────────────────────────────────

/// Check `user` against an allow-list of roles.
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<()> {
    if user.role.is_allowed(allowed) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %user.user_id,
            role = %user.role,
            "Forbidden: role not in allow-list"
        );
        Err(AppError::Forbidden)
    }
}

/// A named allow-list of roles, used as the parameter of [`Authorized`].
pub trait RoleSet {
    const ALLOWED: &'static [Role];
}

/// Coaches and admins.
pub struct Staff;

impl RoleSet for Staff {
    const ALLOWED: &'static [Role] = Role::STAFF;
}

pub struct AdminOnly;

impl RoleSet for AdminOnly {
    const ALLOWED: &'static [Role] = Role::ADMIN_ONLY;
}

/// Extractor that yields the caller only if their role is in `R`.
///
/// Rejects with 401 when the request is unauthenticated and 403 when the
/// role is not allowed. Must run behind [`require_auth`].
pub struct Authorized<R: RoleSet> {
    pub user: AuthUser,
    _roles: PhantomData<fn() -> R>,
}

impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RoleSet,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let user = <AuthUser as FromRequestParts<S>>::from_request_parts(parts, state).await?;
        authorize(&user, R::ALLOWED)?;
        Ok(Self {
            user,
            _roles: PhantomData,
        })
    }
}
