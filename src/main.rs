// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CarSpottr API Server
//!
//! Identifies cars from photos, keeps each user's rarity-ranked collection
//! and serves the community feed.

use carspottr::{
    config::Config, db::FirestoreDb, services::FirebaseTokenVerifier, AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting CarSpottr API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.firebase_project_id).await?;

    let token_verifier = Arc::new(FirebaseTokenVerifier::new(&config.firebase_project_id)?);

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db, token_verifier)?);
    tracing::info!(
        bucket = %config.storage_bucket,
        vision_model = %config.vision_model,
        "Services initialized"
    );

    // Build router
    let app = carspottr::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("carspottr=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
