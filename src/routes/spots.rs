// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scanning and collection routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{
    query_collection, rarity_counts, CarAnalysis, RarityCount, SortOrder, Spot,
};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Spot routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/scan", post(scan))
        .route("/api/spots", post(save_spot).get(list_spots))
}

// ─── Scan ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Base64 JPEG, optionally as a `data:` URL
    pub image_base64: String,
}

/// Identify the car in a photo. Nothing is stored.
async fn scan(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<CarAnalysis>> {
    tracing::info!(user_id = %user.user_id, "Scan requested");
    let analysis = state.vision.analyze_image(&req.image_base64).await?;
    Ok(Json(analysis))
}

// ─── Save ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct SaveSpotRequest {
    pub analysis: CarAnalysis,
    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,
}

/// Save an accepted analysis to the user's collection.
async fn save_spot(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<SaveSpotRequest>,
) -> Result<(StatusCode, Json<Spot>)> {
    req.validate()?;

    let spot = Spot::from_analysis(&user.user_id, req.analysis, req.location, chrono::Utc::now());
    state.db.create_spot(&spot).await?;

    tracing::info!(
        user_id = %user.user_id,
        spot_id = %spot.id,
        rarity = %spot.rarity,
        "Spot saved"
    );

    Ok((StatusCode::CREATED, Json(spot)))
}

// ─── Collection ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CollectionParams {
    /// Tier name; "all" or absent keeps every tier
    pub rarity: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollectionResponse {
    pub spots: Vec<Spot>,
    /// Counts over the whole collection, ignoring the filter
    pub rarity_counts: Vec<RarityCount>,
    pub total: u32,
}

async fn list_spots(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CollectionParams>,
) -> Result<Json<CollectionResponse>> {
    let filter = rarity_filter(params.rarity.as_deref());

    let spots = state.db.get_spots_for_user(&user.user_id).await?;
    let counts = rarity_counts(&spots);
    let total = spots.len() as u32;
    let spots = query_collection(spots, filter, params.sort);

    Ok(Json(CollectionResponse {
        spots,
        rarity_counts: counts,
        total,
    }))
}

/// Normalize the rarity query parameter. `all` and blank mean no filter.
fn rarity_filter(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|f| !f.is_empty() && !f.eq_ignore_ascii_case("all"))
}
