// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (credentials and role)
//! - Email claims (one document per normalized email, enforces uniqueness)
//! - Profiles (document ID is the owning user ID, so at most one per user)

use crate::db::{collections, ProfilePage, ProfileQuery};
use crate::error::AppError;
use crate::models::{Profile, ProfileUpdate, User};
use crate::time_utils::now_rfc3339;
use chrono::{DateTime, Utc};
use firestore::FirestoreWritePrecondition;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Attempts for a precondition-guarded write before giving up.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Marker document reserving an email address for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmailClaim {
    user_id: String,
}

/// Document ID for an email claim. Hashed so that arbitrary email
/// characters never end up in a document path.
fn email_claim_id(normalized_email: &str) -> String {
    hex::encode(Sha256::digest(normalized_email.as_bytes()))
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Create a user and claim their email in one transaction.
    ///
    /// The claim is written with a must-not-exist precondition, so two
    /// concurrent signups for the same email cannot both commit.
    pub async fn create_user(&self, user: &User) -> Result<(), AppError> {
        let client = self.get_client()?;
        let claim_id = email_claim_id(&user.email_normalized);

        if self.get_email_claim(&claim_id).await?.is_some() {
            return Err(email_taken());
        }

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::USER_EMAILS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&claim_id)
            .object(&EmailClaim {
                user_id: user.id.clone(),
            })
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add email claim to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .precondition(FirestoreWritePrecondition::Exists(false))
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user to transaction: {}", e))
            })?;

        if let Err(e) = transaction.commit().await {
            // Lost a race with another signup for the same email?
            if self.get_email_claim(&claim_id).await?.is_some() {
                return Err(email_taken());
            }
            return Err(AppError::Database(format!(
                "User creation commit failed: {}",
                e
            )));
        }

        tracing::debug!(user_id = %user.id, "User created");
        Ok(())
    }

    async fn get_email_claim(&self, claim_id: &str) -> Result<Option<EmailClaim>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USER_EMAILS)
            .obj()
            .one(claim_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Look up a user through their email claim.
    pub async fn find_user_by_email(
        &self,
        normalized_email: &str,
    ) -> Result<Option<User>, AppError> {
        let claim_id = email_claim_id(normalized_email);
        match self.get_email_claim(&claim_id).await? {
            Some(claim) => self.get_user(&claim.user_id).await,
            None => Ok(None),
        }
    }

    /// Apply `change` to an existing user and persist it.
    ///
    /// The write only lands if the document is unchanged since it was read,
    /// so concurrent changes to other fields are never overwritten.
    pub async fn modify_user<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut User) -> Result<T, AppError>,
    {
        self.read_modify_write(collections::USERS, user_id, |existing: Option<User>| {
            let mut user =
                existing.ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
            let email_normalized = user.email_normalized.clone();
            user.updated_at = now_rfc3339();
            let result = change(&mut user)?;
            if user.email_normalized != email_normalized {
                return Err(AppError::Validation("email cannot be changed".to_string()));
            }
            Ok((user, result))
        })
        .await
    }

    /// Delete the user, their profile and their email claim atomically.
    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        let user = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let targets = [
            (collections::PROFILES, user_id.to_string()),
            (
                collections::USER_EMAILS,
                email_claim_id(&user.email_normalized),
            ),
            (collections::USERS, user_id.to_string()),
        ];
        for (collection, doc_id) in &targets {
            client
                .fluent()
                .delete()
                .from(*collection)
                .document_id(doc_id)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!(
                        "Failed to add deletion to transaction for {}: {}",
                        collection, e
                    ))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit user deletion: {}", e)))?;

        tracing::info!(user_id, "User and owned profile deleted");
        Ok(())
    }

    // ─── Profile Operations ──────────────────────────────────────

    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create-or-merge the user's profile.
    ///
    /// Profiles are keyed by user ID, so a duplicate row is impossible. The
    /// create path writes with a must-not-exist precondition: if two first
    /// submissions race, the loser re-reads and merges over the winner.
    pub async fn upsert_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<Profile, AppError> {
        // Zombie prevention: the account may have been deleted after the
        // request was authenticated.
        if self.get_user(user_id).await?.is_none() {
            tracing::warn!(user_id, "User not found, refusing profile write");
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        self.read_modify_write(collections::PROFILES, user_id, |existing| {
            let profile = Profile::upsert(existing, user_id, update.clone(), &now_rfc3339())?;
            Ok((profile.clone(), profile))
        })
        .await
    }

    pub async fn modify_profile<T, F>(&self, user_id: &str, change: F) -> Result<T, AppError>
    where
        F: Fn(&mut Profile) -> Result<T, AppError>,
    {
        self.read_modify_write(collections::PROFILES, user_id, |existing: Option<Profile>| {
            let mut profile =
                existing.ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;
            profile.updated_at = now_rfc3339();
            let result = change(&mut profile)?;
            Ok((profile, result))
        })
        .await
    }

    pub async fn delete_profile(&self, user_id: &str) -> Result<bool, AppError> {
        if self.get_profile(user_id).await?.is_none() {
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PROFILES)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(true)
    }

    /// List profiles matching `query`.
    ///
    /// The experience level filter runs in Firestore. Sport matching is
    /// case-insensitive and location is a substring match, so both run on
    /// the returned documents along with pagination.
    pub async fn list_profiles(&self, query: &ProfileQuery) -> Result<ProfilePage, AppError> {
        let level = query.experience_level;

        let profiles: Vec<Profile> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PROFILES)
            .filter(move |q| {
                q.for_all([level.and_then(|l| q.field("experience_level").eq(l.as_str()))])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(query.paginate(profiles))
    }

    // ─── Optimistic Writes ───────────────────────────────────────

    /// Read a document along with its last update time.
    async fn get_versioned<D>(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> Result<Option<(D, DateTime<Utc>)>, AppError>
    where
        D: DeserializeOwned,
    {
        let doc = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let Some(doc) = doc else {
            return Ok(None);
        };

        let update_time = doc
            .update_time
            .clone()
            .ok_or_else(|| {
                AppError::Database(format!("{}/{} has no update time", collection, doc_id))
            })
            .and_then(|ts| {
                firestore::timestamp_utils::from_timestamp(ts)
                    .map_err(|e| AppError::Database(e.to_string()))
            })?;
        let value = firestore::FirestoreDb::deserialize_doc_to::<D>(&doc)
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some((value, update_time)))
    }

    /// Read a document, compute its replacement with `change`, and write it
    /// back only if nobody else wrote in between.
    ///
    /// An existing document is guarded by its update time and a missing one
    /// by a must-not-exist precondition. On a lost race the whole cycle runs
    /// again with fresh data, so `change` may be called more than once.
    async fn read_modify_write<D, T, F>(
        &self,
        collection: &'static str,
        doc_id: &str,
        change: F,
    ) -> Result<T, AppError>
    where
        D: Serialize + DeserializeOwned + Sync + Send,
        F: Fn(Option<D>) -> Result<(D, T), AppError>,
    {
        let mut last_error = None;

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let (existing, precondition) = match self.get_versioned::<D>(collection, doc_id).await? {
                Some((value, update_time)) => (
                    Some(value),
                    FirestoreWritePrecondition::UpdateTime(update_time),
                ),
                None => (None, FirestoreWritePrecondition::Exists(false)),
            };
            let (document, result) = change(existing)?;

            let written: Result<(), _> = self
                .get_client()?
                .fluent()
                .update()
                .in_col(collection)
                .precondition(precondition)
                .document_id(doc_id)
                .object(&document)
                .execute()
                .await;

            match written {
                Ok(()) => return Ok(result),
                Err(e) => {
                    tracing::warn!(
                        collection,
                        doc_id,
                        attempt,
                        error = %e,
                        "Write lost a race, retrying"
                    );
                    last_error = Some(AppError::Database(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            AppError::Database(format!("Write to {}/{} failed", collection, doc_id))
        }))
    }
}

fn email_taken() -> AppError {
    AppError::Conflict("An account with this email already exists".to_string())
}
