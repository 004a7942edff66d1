// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Spot model: one user's saved record of an identified vehicle.

use crate::models::{CarAnalysis, RarityTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Location stored when the client could not resolve a place name.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

/// Stored spot record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Spot {
    /// Spot ID (also used as document ID)
    pub id: String,
    /// Owning user's auth uid
    pub user_id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    /// When the spot was saved
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
    pub location: String,
    pub rarity: RarityTier,
    pub performance: String,
    pub features: String,
    pub value_range: String,
    pub trivia: String,
}

impl Spot {
    /// Promote an accepted analysis into a spot owned by `user_id`.
    ///
    /// A rarity label that names no tier is stored as Bronze.
    pub fn from_analysis(
        user_id: &str,
        analysis: CarAnalysis,
        location: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let rarity = RarityTier::from_label(&analysis.rarity).unwrap_or_else(|| {
            tracing::warn!(
                label = %analysis.rarity,
                "Unrecognized rarity label, saving as Bronze"
            );
            RarityTier::Bronze
        });

        let location = location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            make: analysis.make,
            model: analysis.model,
            year: analysis.year,
            created_at,
            location,
            rarity,
            performance: analysis.performance,
            features: analysis.features,
            value_range: analysis.value_range,
            trivia: analysis.trivia,
        }
    }
}
