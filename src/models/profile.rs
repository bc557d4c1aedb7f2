// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Player profile model.
//!
//! A profile belongs to exactly one user and is keyed by that user's ID.
//! Achievements are stored inline as sub-records.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use validator::Validate;

pub const DEFAULT_POSITION: &str = "N/A";
pub const DEFAULT_LOCATION: &str = "Unknown";
pub const MAX_BIO_LEN: u64 = 300;

/// Self-reported experience level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Professional,
}

impl ExperienceLevel {
    /// Stored representation, matching the serde form.
    pub fn as_str(self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Advanced => "Advanced",
            ExperienceLevel::Professional => "Professional",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

impl SocialLinks {
    /// Overwrite only the links present in `other`.
    fn merge(&mut self, other: SocialLinks) {
        if other.instagram.is_some() {
            self.instagram = other.instagram;
        }
        if other.twitter.is_some() {
            self.twitter = other.twitter;
        }
        if other.linkedin.is_some() {
            self.linkedin = other.linkedin;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Tournament,
    Award,
    Record,
    Milestone,
    Certification,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementLevel {
    International,
    National,
    State,
    District,
    School,
    Club,
}

/// Achievement sub-record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Date achieved (YYYY-MM-DD)
    pub date: String,
    pub category: AchievementCategory,
    pub level: AchievementLevel,
    #[serde(default)]
    pub verified: bool,
    /// User ID of the coach/admin who verified it
    #[serde(default)]
    pub verified_by: Option<String>,
}

/// Request body for adding an achievement.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewAchievement {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    pub date: String,
    pub category: AchievementCategory,
    pub level: AchievementLevel,
}

impl NewAchievement {
    pub fn into_achievement(self) -> Result<Achievement, AppError> {
        self.validate()?;
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be blank".to_string()));
        }
        check_date("date", &self.date)?;

        Ok(Achievement {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            description: self.description,
            date: self.date,
            category: self.category,
            level: self.level,
            verified: false,
            verified_by: None,
        })
    }
}

/// Player profile, one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user's ID (also used as document ID)
    pub user_id: String,
    pub sport: String,
    pub position: String,
    #[serde(default)]
    pub experience_level: ExperienceLevel,
    pub location: String,
    #[serde(default)]
    pub bio: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub weight: Option<String>,
    /// Free-form sport-specific statistics
    #[serde(default)]
    pub stats: BTreeMap<String, Value>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub social_links: SocialLinks,
    pub created_at: String,
    pub updated_at: String,
}

/// Partial profile update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 50))]
    pub sport: Option<String>,
    #[validate(length(max = 50))]
    pub position: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    #[validate(length(max = 100))]
    pub location: Option<String>,
    #[validate(length(max = 300))]
    pub bio: Option<String>,
    pub date_of_birth: Option<String>,
    #[validate(length(max = 20))]
    pub height: Option<String>,
    #[validate(length(max = 20))]
    pub weight: Option<String>,
    pub stats: Option<BTreeMap<String, Value>>,
    pub social_links: Option<SocialLinks>,
}

impl ProfileUpdate {
    /// Validate field constraints that do not depend on existing state.
    pub fn check(&self) -> Result<(), AppError> {
        self.validate()?;
        if let Some(sport) = &self.sport {
            if sport.trim().is_empty() {
                return Err(AppError::Validation("sport must not be blank".to_string()));
            }
        }
        if let Some(dob) = &self.date_of_birth {
            check_date("date_of_birth", dob)?;
        }
        Ok(())
    }
}

impl Profile {
    /// Build a new profile for `user_id`. A sport is required on creation.
    pub fn create(user_id: &str, update: ProfileUpdate, now: &str) -> Result<Self, AppError> {
        let sport = update
            .sport
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::Validation("sport is required".to_string()))?
            .to_string();

        let mut profile = Self {
            user_id: user_id.to_string(),
            sport,
            position: DEFAULT_POSITION.to_string(),
            experience_level: ExperienceLevel::default(),
            location: DEFAULT_LOCATION.to_string(),
            bio: None,
            date_of_birth: None,
            height: None,
            weight: None,
            stats: BTreeMap::new(),
            achievements: Vec::new(),
            social_links: SocialLinks::default(),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        };
        profile.apply(
            ProfileUpdate {
                sport: None,
                ..update
            },
            now,
        );
        Ok(profile)
    }

    /// Merge the supplied fields into this profile.
    pub fn apply(&mut self, update: ProfileUpdate, now: &str) {
        if let Some(sport) = update.sport {
            self.sport = sport.trim().to_string();
        }
        if let Some(position) = update.position {
            self.position = position;
        }
        if let Some(level) = update.experience_level {
            self.experience_level = level;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if update.bio.is_some() {
            self.bio = update.bio;
        }
        if update.date_of_birth.is_some() {
            self.date_of_birth = update.date_of_birth;
        }
        if update.height.is_some() {
            self.height = update.height;
        }
        if update.weight.is_some() {
            self.weight = update.weight;
        }
        if let Some(stats) = update.stats {
            self.stats = stats;
        }
        if let Some(links) = update.social_links {
            self.social_links.merge(links);
        }
        self.updated_at = now.to_string();
    }

    /// Create-or-merge, the single code path both store backends use.
    pub fn upsert(
        existing: Option<Profile>,
        user_id: &str,
        update: ProfileUpdate,
        now: &str,
    ) -> Result<Profile, AppError> {
        match existing {
            Some(mut profile) => {
                profile.apply(update, now);
                Ok(profile)
            }
            None => Profile::create(user_id, update, now),
        }
    }

    pub fn find_achievement_mut(&mut self, achievement_id: &str) -> Option<&mut Achievement> {
        self.achievements.iter_mut().find(|a| a.id == achievement_id)
    }
}

fn check_date(field: &str, value: &str) -> Result<(), AppError> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| AppError::Validation(format!("{} must be a YYYY-MM-DD date", field)))
}
