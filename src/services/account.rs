// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Account service: signup, login and credential management.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Role, User, UserResponse};
use crate::services::password::PasswordHasher;
use crate::services::token::TokenService;
use crate::time_utils::now_rfc3339;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 50))]
    pub sport: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Fields a user may change on their own account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub sport: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// Issued session: token plus the public view of the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub token: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Handles credentials. Never returns password hashes to callers.
#[derive(Clone)]
pub struct AccountService {
    db: Database,
    passwords: PasswordHasher,
    tokens: TokenService,
    /// Verified against when the email is unknown, so both login failure
    /// paths cost one hash verification.
    decoy_hash: String,
}

impl AccountService {
    pub fn new(db: Database, passwords: PasswordHasher, tokens: TokenService) -> Result<Self> {
        let decoy_hash = passwords
            .hash(&uuid::Uuid::new_v4().to_string())
            .map_err(|e| AppError::Internal(e.into()))?;
        Ok(Self {
            db,
            passwords,
            tokens,
            decoy_hash,
        })
    }

    /// Hash off the async runtime; argon2 is deliberately slow.
    async fn hash_password(&self, password: String) -> Result<String> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .map_err(|e| AppError::Internal(e.into()))
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        let passwords = self.passwords.clone();
        tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }

    fn session_for(&self, user: User) -> Result<AuthResponse> {
        let token = self.tokens.issue(&user.id, user.role)?;
        Ok(AuthResponse {
            token,
            expires_in: self.tokens.ttl_secs(),
            user: user.into(),
        })
    }

    /// Register a new athlete account and open a session for it.
    pub async fn signup(&self, request: SignupRequest) -> Result<AuthResponse> {
        let request = SignupRequest {
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            sport: request
                .sport
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            ..request
        };
        request.validate()?;

        let email_normalized = User::normalize_email(&request.email);

        // Cheap pre-check so duplicates fail before paying for a hash.
        // The store still enforces uniqueness on insert.
        if self.db.find_user_by_email(&email_normalized).await?.is_some() {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        let password_hash = self.hash_password(request.password).await?;
        let now = now_rfc3339();
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: request.name,
            email: request.email,
            email_normalized,
            password_hash,
            role: Role::Athlete,
            sport: request.sport,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db.create_user(&user).await?;
        tracing::info!(user_id = %user.id, "User signed up");

        self.session_for(user)
    }

    /// Check credentials and open a session.
    ///
    /// Unknown email and wrong password produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse> {
        let user = self.db.find_user_by_email(&request.email).await?;

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.decoy_hash.clone());
        let password_ok = self.verify_password(request.password, hash).await?;

        match user {
            Some(user) if password_ok => {
                tracing::info!(user_id = %user.id, "User logged in");
                self.session_for(user)
            }
            _ => {
                tracing::warn!("Failed login attempt");
                Err(AppError::Unauthorized)
            }
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        self.db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }

    pub async fn update_me(&self, user_id: &str, request: UpdateMeRequest) -> Result<User> {
        let request = UpdateMeRequest {
            name: request.name.map(|n| n.trim().to_string()),
            sport: request.sport.map(|s| s.trim().to_string()),
        };
        request.validate()?;
        let UpdateMeRequest { name, sport } = request;

        self.db
            .modify_user(user_id, |user| {
                if let Some(name) = &name {
                    user.name = name.clone();
                }
                if let Some(sport) = &sport {
                    user.sport = Some(sport.clone());
                }
                Ok(user.clone())
            })
            .await
    }

    /// Replace the password after re-checking the current one.
    ///
    /// Only the hash is written. If the password changed again while the new
    /// hash was being computed, the request fails with `Conflict`.
    pub async fn change_password(
        &self,
        user_id: &str,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        request.validate()?;
        let user = self.get_user(user_id).await?;
        let checked_hash = user.password_hash;

        let current_ok = self
            .verify_password(request.current_password, checked_hash.clone())
            .await?;
        if !current_ok {
            tracing::warn!(user_id, "Password change rejected: wrong current password");
            return Err(AppError::Unauthorized);
        }

        let new_hash = self.hash_password(request.new_password).await?;
        self.db
            .modify_user(user_id, |user| {
                if user.password_hash != checked_hash {
                    return Err(AppError::Conflict(
                        "Password was changed by another request".to_string(),
                    ));
                }
                user.password_hash = new_hash.clone();
                Ok(())
            })
            .await?;

        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Delete the account. The user's profile goes with it.
    pub async fn delete_account(&self, user_id: &str) -> Result<()> {
        self.db.delete_user(user_id).await?;
        tracing::info!(user_id, "Account deleted");
        Ok(())
    }

    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<User> {
        self.db
            .modify_user(user_id, |user| {
                if user.role != role {
                    tracing::info!(user_id, from = %user.role, to = %role, "Role changed");
                    user.role = role;
                }
                Ok(user.clone())
            })
            .await
    }
}
