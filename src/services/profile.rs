// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile ownership service.
//!
//! Every write is keyed by the authenticated user's ID, so a caller can
//! only ever touch their own profile (staff operations take the target ID
//! explicitly and are gated by role at the route).

use crate::db::{Database, ProfileQuery};
use crate::error::{AppError, Result};
use crate::models::{Achievement, NewAchievement, Profile, ProfileUpdate};
use futures_util::{stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const MAX_CONCURRENT_OWNER_LOOKUPS: usize = 16;

/// Public identity of a profile's owner.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerOwner {
    pub id: String,
    pub name: String,
}

/// A profile joined with its owner.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
    pub owner: PlayerOwner,
    pub profile: Profile,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerPage {
    pub players: Vec<PlayerView>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Clone)]
pub struct ProfileService {
    db: Database,
}

impl ProfileService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create the caller's profile, or merge into it if one exists.
    pub async fn upsert_profile(&self, user_id: &str, update: ProfileUpdate) -> Result<Profile> {
        update.check()?;
        let profile = self.db.upsert_profile(user_id, update).await?;
        tracing::info!(user_id, sport = %profile.sport, "Profile saved");
        Ok(profile)
    }

    pub async fn get_own_profile(&self, user_id: &str) -> Result<Profile> {
        self.db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("You have not created a profile yet".to_string()))
    }

    pub async fn delete_own_profile(&self, user_id: &str) -> Result<()> {
        if !self.db.delete_profile(user_id).await? {
            return Err(AppError::NotFound("Profile not found".to_string()));
        }
        tracing::info!(user_id, "Profile deleted");
        Ok(())
    }

    // ─── Achievements ────────────────────────────────────────────

    pub async fn add_achievement(
        &self,
        user_id: &str,
        request: NewAchievement,
    ) -> Result<Achievement> {
        let achievement = request.into_achievement()?;
        self.db
            .modify_profile(user_id, |profile| {
                profile.achievements.push(achievement.clone());
                Ok(())
            })
            .await?;
        Ok(achievement)
    }

    pub async fn remove_achievement(&self, user_id: &str, achievement_id: &str) -> Result<()> {
        self.db
            .modify_profile(user_id, |profile| {
                let before = profile.achievements.len();
                profile.achievements.retain(|a| a.id != achievement_id);
                if profile.achievements.len() == before {
                    return Err(AppError::NotFound("Achievement not found".to_string()));
                }
                Ok(())
            })
            .await
    }

    /// Mark another player's achievement as verified by `verifier_id`.
    pub async fn verify_achievement(
        &self,
        player_id: &str,
        achievement_id: &str,
        verifier_id: &str,
    ) -> Result<Achievement> {
        let achievement = self
            .db
            .modify_profile(player_id, |profile| {
                let achievement = profile
                    .find_achievement_mut(achievement_id)
                    .ok_or_else(|| AppError::NotFound("Achievement not found".to_string()))?;
                achievement.verified = true;
                achievement.verified_by = Some(verifier_id.to_string());
                Ok(achievement.clone())
            })
            .await?;

        tracing::info!(player_id, achievement_id, verifier_id, "Achievement verified");
        Ok(achievement)
    }

    // ─── Staff Operations ────────────────────────────────────────

    /// Replace a player's stats map.
    pub async fn set_stats(
        &self,
        player_id: &str,
        stats: BTreeMap<String, Value>,
        editor_id: &str,
    ) -> Result<Profile> {
        let profile = self
            .db
            .modify_profile(player_id, |profile| {
                profile.stats = stats.clone();
                Ok(profile.clone())
            })
            .await?;

        tracing::info!(player_id, editor_id, "Player stats updated");
        Ok(profile)
    }

    // ─── Browse ──────────────────────────────────────────────────

    /// Fetch one player with the owner join done explicitly.
    pub async fn get_player(&self, user_id: &str) -> Result<PlayerView> {
        let profile = self
            .db
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))?;
        self.join_owner(profile)
            .await?
            .ok_or_else(|| AppError::NotFound("Player not found".to_string()))
    }

    pub async fn browse(&self, query: ProfileQuery) -> Result<PlayerPage> {
        query.check()?;
        let page = self.db.list_profiles(&query).await?;

        let joined: Vec<Result<Option<PlayerView>>> = stream::iter(page.profiles)
            .map(|profile| self.join_owner(profile))
            .buffered(MAX_CONCURRENT_OWNER_LOOKUPS)
            .collect()
            .await;

        let mut players = Vec::with_capacity(joined.len());
        let mut orphans = 0;
        for view in joined {
            // Owner deleted between the two reads: drop the orphan.
            match view? {
                Some(view) => players.push(view),
                None => orphans += 1,
            }
        }
        if orphans > 0 {
            tracing::warn!(orphans, "Dropped profiles whose owner no longer exists");
        }

        Ok(PlayerPage {
            players,
            total: page.total.saturating_sub(orphans),
            page: query.page,
            per_page: query.per_page,
        })
    }

    async fn join_owner(&self, profile: Profile) -> Result<Option<PlayerView>> {
        let owner = self.db.get_user(&profile.user_id).await?;
        Ok(owner.map(|user| PlayerView {
            owner: PlayerOwner {
                id: user.id,
                name: user.name,
            },
            profile,
        }))
    }
}
