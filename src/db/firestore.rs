// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (display name, entitlement flag)
//! - Spots (saved car identifications)
//! - Posts (social feed)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Post, Profile, Spot};
use crate::time_utils::format_utc_rfc3339;
use futures_util::{stream, StreamExt};
use std::collections::HashMap;

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// What an account's data deletion removed.
#[derive(Debug, Default)]
pub struct DeletedUserData {
    /// Number of documents deleted
    pub documents: usize,
    /// IDs of deleted posts (for feed subscribers)
    pub post_ids: Vec<String>,
    /// Image URLs of deleted posts (for storage cleanup)
    pub image_urls: Vec<String>,
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

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a profile by auth uid.
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

    /// Create or update a profile.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a profile, creating an anonymous one if the user has none yet.
    pub async fn ensure_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        if let Some(profile) = self.get_profile(user_id).await? {
            return Ok(profile);
        }

        let now = format_utc_rfc3339(chrono::Utc::now());
        let profile = Profile::new(
            user_id,
            Some(crate::models::profile::ANONYMOUS_NAME.to_string()),
            &now,
        );
        self.upsert_profile(&profile).await?;
        tracing::info!(user_id, "Created anonymous profile");
        Ok(profile)
    }

    /// Fetch several profiles, keyed by uid. Missing profiles are absent from the map.
    pub async fn get_profiles(
        &self,
        user_ids: &[String],
    ) -> Result<HashMap<String, Profile>, AppError> {
        let found = stream::iter(user_ids.to_vec())
            .map(|user_id| async move { self.get_profile(&user_id).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Option<Profile>, AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Option<Profile>>, AppError>>()?;

        Ok(found
            .into_iter()
            .flatten()
            .map(|p| (p.id.clone(), p))
            .collect())
    }

    /// Record the user's pro entitlement on their profile.
    pub async fn set_profile_pro(&self, user_id: &str, is_pro: bool) -> Result<(), AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());
        // Fetch-modify-write to preserve other fields
        let mut profile = self
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::new(user_id, None, &now));

        if profile.is_pro == is_pro {
            return Ok(());
        }

        profile.is_pro = is_pro;
        profile.updated_at = now;
        self.upsert_profile(&profile).await
    }

    // ─── Spot Operations ─────────────────────────────────────────

    /// Store a new spot.
    pub async fn create_spot(&self, spot: &Spot) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SPOTS)
            .document_id(&spot.id)
            .object(spot)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get every spot owned by a user (unordered).
    pub async fn get_spots_for_user(&self, user_id: &str) -> Result<Vec<Spot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SPOTS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Post Operations ─────────────────────────────────────────

    /// Store a new post.
    pub async fn create_post(&self, post: &Post) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::POSTS)
            .document_id(&post.id)
            .object(post)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a post by ID.
    pub async fn get_post(&self, post_id: &str) -> Result<Option<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::POSTS)
            .obj()
            .one(post_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All posts, newest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>, AppError> {
        let mut posts: Vec<Post> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .order_by([("created_at", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Stored timestamps are strings; re-sort on the parsed values.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Delete a post document.
    pub async fn delete_post(&self, post_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::POSTS)
            .document_id(post_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Helper Methods ────────────────────────────────────────────

    /// Helper to batch delete documents using transactions.
    async fn batch_delete<T, F>(
        &self,
        items: &[T],
        collection: &str,
        id_extractor: F,
    ) -> Result<(), AppError>
    where
        F: Fn(&T) -> String,
    {
        let client = self.get_client()?;

        for chunk in items.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for item in chunk {
                let doc_id = id_extractor(item);
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }

    async fn get_posts_for_user(&self, user_id: &str) -> Result<Vec<Post>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::POSTS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Account Data Deletion ─────────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes from all collections:
    /// - `spots` (query by user_id)
    /// - `posts` (query by user_id)
    /// - `profiles/{user_id}`
    ///
    /// Images referenced by the deleted posts are returned for the caller
    /// to remove from storage.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<DeletedUserData, AppError> {
        let mut deleted = DeletedUserData::default();

        // 1. Delete all spots
        let spots = self.get_spots_for_user(user_id).await?;
        self.batch_delete(&spots, collections::SPOTS, |spot: &Spot| spot.id.clone())
            .await?;
        deleted.documents += spots.len();
        tracing::debug!(user_id, count = spots.len(), "Deleted spots");

        // 2. Delete all posts
        let posts = self.get_posts_for_user(user_id).await?;
        self.batch_delete(&posts, collections::POSTS, |post: &Post| post.id.clone())
            .await?;
        deleted.documents += posts.len();
        for post in posts {
            deleted.post_ids.push(post.id);
            deleted.image_urls.extend(post.image_url);
        }
        tracing::debug!(user_id, "Deleted posts");

        // 3. Delete profile
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PROFILES)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        deleted.documents += 1;
        tracing::debug!(user_id, "Deleted profile");

        tracing::info!(
            user_id,
            deleted_count = deleted.documents,
            "User data deletion complete"
        );

        Ok(deleted)
    }
}
