// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! CarSpottr: identify cars from photos and build a collection
//!
//! This crate provides the backend API: AI-assisted car identification,
//! a rarity-ranked collection with collector progression, a social feed
//! with live updates, and in-app purchase entitlements.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{
    FeedBroadcaster, FirebaseTokenVerifier, IdentityService, PurchasesService, StorageService,
    VisionService,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub vision: VisionService,
    pub storage: StorageService,
    pub identity: IdentityService,
    pub token_verifier: Arc<FirebaseTokenVerifier>,
    pub purchases: PurchasesService,
    pub feed: FeedBroadcaster,
}

impl AppState {
    /// Build the outbound API clients from configuration.
    pub fn new(
        config: Config,
        db: FirestoreDb,
        token_verifier: Arc<FirebaseTokenVerifier>,
    ) -> Result<Self, error::AppError> {
        Ok(Self {
            vision: VisionService::new(
                config.vision_base_url.clone(),
                config.vision_api_key.clone(),
                config.vision_model.clone(),
            )?,
            storage: StorageService::new(
                config.storage_base_url.clone(),
                config.storage_bucket.clone(),
            )?,
            identity: IdentityService::new(
                config.identity_base_url.clone(),
                config.secure_token_base_url.clone(),
                config.firebase_api_key.clone(),
            )?,
            purchases: PurchasesService::new(
                config.purchases_base_url.clone(),
                config.purchases_api_key.clone(),
            )?,
            feed: FeedBroadcaster::default(),
            config,
            db,
            token_verifier,
        })
    }
}
