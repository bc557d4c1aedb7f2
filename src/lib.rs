// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Khelo: athlete profiles for every sport
//!
//! This crate provides the backend API for account signup and login,
//! stateless session tokens, and one-profile-per-user ownership, plus a
//! small client that carries a session across calls.

pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{AccountService, PasswordHasher, ProfileService, TokenService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub profiles: ProfileService,
}

impl AppState {
    /// Wire the services together over `db`.
    pub fn new(config: Config, db: Database) -> Result<Self, AppError> {
        let passwords =
            PasswordHasher::new(config.hash_cost).map_err(|e| AppError::Internal(e.into()))?;
        let tokens = TokenService::from_config(&config);
        let accounts = AccountService::new(db.clone(), passwords, tokens.clone())?;
        let profiles = ProfileService::new(db.clone());

        Ok(Self {
            config,
            db,
            tokens,
            accounts,
            profiles,
        })
    }
}
