// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database layer.
//!
//! Two backends share one set of operations: Firestore for deployments and
//! an in-process store for local development and tests. Joins between
//! profiles and users are never implicit; callers fetch both explicitly.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::StoreUrl;
use crate::error::AppError;
use crate::models::{ExperienceLevel, Profile, ProfileUpdate, User};
use serde::Deserialize;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Email uniqueness claims, keyed by hashed normalized email
    pub const USER_EMAILS: &str = "user_emails";
    /// Player profiles, keyed by owning user ID
    pub const PROFILES: &str = "profiles";
}

pub const MAX_PER_PAGE: u32 = 100;

fn default_page() -> u32 {
    1
}
fn default_per_page() -> u32 {
    20
}

/// Filters for browsing player profiles.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileQuery {
    pub sport: Option<String>,
    /// Case-insensitive substring match
    pub location: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    /// 1-indexed page number
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            sport: None,
            location: None,
            experience_level: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl ProfileQuery {
    pub fn check(&self) -> Result<(), AppError> {
        if self.page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_string()));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(AppError::Validation(format!(
                "per_page must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }
        Ok(())
    }

    pub fn matches(&self, profile: &Profile) -> bool {
        if let Some(sport) = &self.sport {
            if !profile.sport.eq_ignore_ascii_case(sport) {
                return false;
            }
        }
        if let Some(level) = self.experience_level {
            if profile.experience_level != level {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if !profile
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Filter, order newest first, and cut out the requested page.
    pub fn paginate(&self, profiles: Vec<Profile>) -> ProfilePage {
        let mut matching: Vec<Profile> =
            profiles.into_iter().filter(|p| self.matches(p)).collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let total = matching.len();
        let skip = ((self.page - 1) as usize).saturating_mul(self.per_page as usize);
        let profiles = matching
            .into_iter()
            .skip(skip)
            .take(self.per_page as usize)
            .collect();

        ProfilePage { profiles, total }
    }
}

/// One page of profiles plus the total number of matches.
#[derive(Debug, Clone)]
pub struct ProfilePage {
    pub profiles: Vec<Profile>,
    pub total: usize,
}

/// Backing store for users and profiles.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Connect to the store named by `url`.
    pub async fn connect(url: &StoreUrl) -> Result<Self, AppError> {
        match url {
            StoreUrl::Memory => {
                tracing::warn!("Using in-memory store; data will not survive a restart");
                Ok(Self::Memory(MemoryDb::new()))
            }
            StoreUrl::Firestore { project_id } => {
                Ok(Self::Firestore(FirestoreDb::new(project_id).await?))
            }
        }
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Insert a new user. Fails with `Conflict` if the email is taken.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.create_user(user).await,
            Self::Memory(db) => db.create_user(user),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        match self {
            Self::Firestore(db) => db.get_user(user_id).await,
            Self::Memory(db) => Ok(db.get_user(user_id)),
        }
    }

    /// Case-insensitive email lookup.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let normalized = User::normalize_email(email);
        match self {
            Self::Firestore(db) => db.find_user_by_email(&normalized).await,
            Self::Memory(db) => Ok(db.find_user_by_email(&normalized)),
        }
    }

    /// Apply `change` to an existing user and persist it. The email may not
    /// change.
    ///
    /// The change lands atomically against the stored record, so concurrent
    /// updates to other fields are kept. `change` may run more than once.
    pub async fn modify_user<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut User) -> Result<T, AppError>,
    {
        match self {
            Self::Firestore(db) => db.modify_user(user_id, change).await,
            Self::Memory(db) => db.modify_user(user_id, change),
        }
    }

    /// Delete a user along with their profile and email claim.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        match self {
            Self::Firestore(db) => db.delete_user(user_id).await,
            Self::Memory(db) => db.delete_user(user_id),
        }
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match self {
            Self::Firestore(db) => db.get_profile(user_id).await,
            Self::Memory(db) => Ok(db.get_profile(user_id)),
        }
    }

    /// Create the user's profile or merge `update` into the existing one.
    ///
    /// Fails with `NotFound` if the owning user no longer exists.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        match self {
            Self::Firestore(db) => db.upsert_profile(user_id, update).await,
            Self::Memory(db) => db.upsert_profile(user_id, update),
        }
    }

    /// Apply `change` to an existing profile and persist it.
    ///
    /// `change` may run more than once if the write races another writer.
    pub async fn modify_profile<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut Profile) -> Result<T, AppError>,
    {
        match self {
            Self::Firestore(db) => db.modify_profile(user_id, change).await,
            Self::Memory(db) => db.modify_profile(user_id, change),
        }
    }

    /// Returns `false` if there was no profile to delete.
    pub async fn delete_profile(&self, user_id: &str) -> Result<bool, AppError> {
        match self {
            Self::Firestore(db) => db.delete_profile(user_id).await,
            Self::Memory(db) => Ok(db.delete_profile(user_id)),
        }
    }

    pub async fn list_profiles(&self, query: &ProfileQuery) -> Result<ProfilePage, AppError> {
        match self {
            Self::Firestore(db) => db.list_profiles(query).await,
            Self::Memory(db) => Ok(db.list_profiles(query)),
        }
    }
}
