// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app purchase routes.

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::{Offering, Platform, PurchaseOutcome};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Purchase routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/purchases/offerings", get(get_offerings))
        .route("/api/purchases", post(purchase))
        .route("/api/purchases/entitlement", get(get_entitlement))
}

#[derive(Debug, Deserialize)]
pub struct OfferingsParams {
    pub platform: Platform,
}

/// Current offering, or `null` on platforms without purchases.
async fn get_offerings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<OfferingsParams>,
) -> Result<Json<Option<Offering>>> {
    let offering = state
        .purchases
        .get_offerings(&user.user_id, params.platform)
        .await?;
    Ok(Json(offering))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PurchaseRequest {
    pub platform: Platform,
    #[validate(length(min = 1, max = 200, message = "Product ID is required"))]
    pub product_id: String,
    /// Store receipt or purchase token
    #[validate(length(min = 1, message = "Receipt is required"))]
    pub fetch_token: String,
}

/// Record a store purchase. `null` on platforms without purchases.
async fn purchase(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PurchaseRequest>,
) -> Result<Json<Option<PurchaseOutcome>>> {
    req.validate()?;

    let outcome = state
        .purchases
        .purchase(&user.user_id, req.platform, &req.product_id, &req.fetch_token)
        .await?;

    if let Some(outcome) = &outcome {
        // The webhook also records this; failing here must not fail the purchase.
        if let Err(e) = state.db.set_profile_pro(&user.user_id, outcome.is_pro).await {
            tracing::warn!(user_id = %user.user_id, error = %e, "Failed to record entitlement on profile");
        }
    }

    Ok(Json(outcome))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EntitlementResponse {
    pub is_pro: bool,
}

async fn get_entitlement(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<EntitlementResponse>> {
    let is_pro = state.purchases.is_pro(&user.user_id).await?;
    Ok(Json(EntitlementResponse { is_pro }))
}
