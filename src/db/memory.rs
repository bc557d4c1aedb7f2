// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Uniqueness (one email per user, one profile per user) is enforced by the
//! map entry API, which holds the shard lock across the check and the write.

use crate::db::{ProfilePage, ProfileQuery};
use crate::error::AppError;
use crate::models::{Profile, ProfileUpdate, User};
use crate::time_utils::now_rfc3339;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    users: DashMap<String, User>,
    /// normalized email -> user ID
    emails: DashMap<String, String>,
    /// user ID -> profile
    profiles: DashMap<String, Profile>,
}

/// In-memory database. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryDb {
    tables: Arc<Tables>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── User Operations ─────────────────────────────────────────

    pub fn create_user(&self, user: &User) -> Result<(), AppError> {
        match self.tables.emails.entry(user.email_normalized.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                self.tables.users.insert(user.id.clone(), user.clone());
                slot.insert(user.id.clone());
                Ok(())
            }
        }
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.tables.users.get(user_id).map(|u| u.clone())
    }

    pub fn find_user_by_email(&self, normalized_email: &str) -> Option<User> {
        let user_id = self.tables.emails.get(normalized_email)?.clone();
        self.get_user(&user_id)
    }

    pub fn modify_user<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut User) -> Result<T, AppError>,
    {
        let mut entry = self
            .tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let mut user = entry.clone();
        user.updated_at = now_rfc3339();
        let result = change(&mut user)?;
        if user.email_normalized != entry.email_normalized {
            return Err(AppError::Validation("email cannot be changed".to_string()));
        }
        *entry = user;
        Ok(result)
    }

    pub fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let (_, user) = self
            .tables
            .users
            .remove(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        self.tables.profiles.remove(user_id);
        self.tables.emails.remove(&user.email_normalized);
        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub fn get_profile(&self, user_id: &str) -> Option<Profile> {
        self.tables.profiles.get(user_id).map(|p| p.clone())
    }

    pub fn upsert_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile, AppError> {
        // Holding the owner's entry blocks a concurrent account deletion
        // until the profile write is done.
        let _owner = self
            .tables
            .users
            .get(user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        let now = now_rfc3339();
        match self.tables.profiles.entry(user_id.to_string()) {
            Entry::Occupied(mut slot) => {
                let profile = Profile::upsert(Some(slot.get().clone()), user_id, update, &now)?;
                slot.insert(profile.clone());
                Ok(profile)
            }
            Entry::Vacant(slot) => {
                let profile = Profile::upsert(None, user_id, update, &now)?;
                slot.insert(profile.clone());
                Ok(profile)
            }
        }
    }

    pub fn modify_profile<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut Profile) -> Result<T, AppError>,
    {
        let mut entry = self
            .tables
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

        // Apply to a copy so a failed change leaves the stored profile intact.
        let mut profile = entry.clone();
        profile.updated_at = now_rfc3339();
        let result = change(&mut profile)?;
        *entry = profile;
        Ok(result)
    }

    pub fn delete_profile(&self, user_id: &str) -> bool {
        self.tables.profiles.remove(user_id).is_some()
    }

    /// Store a profile without checking its owner.
    #[cfg(test)]
    pub(crate) fn insert_profile_unchecked(&self, profile: Profile) {
        self.tables.profiles.insert(profile.user_id.clone(), profile);
    }

    pub fn list_profiles(&self, query: &ProfileQuery) -> ProfilePage {
        let profiles: Vec<Profile> = self
            .tables
            .profiles
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        query.paginate(profiles)
    }
}
