//! Profile statistics derived from a user's spots.
//!
//! Nothing here is stored: every aggregate is recomputed from the spot list
//! when the profile is requested.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BTreeMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::{CollectorProgress, RarityTier, Spot};

/// Spots needed for the "Dedicated Spotter" achievement.
const DEDICATED_SPOTTER_GOAL: u32 = 10;

/// Number of spots of one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RarityCount {
    pub rarity: RarityTier,
    pub count: u32,
}

/// Count spots per tier, strongest tier first. Tiers with no spots are omitted.
pub fn rarity_counts(spots: &[Spot]) -> Vec<RarityCount> {
    let mut by_tier: BTreeMap<RarityTier, u32> = BTreeMap::new();
    for spot in spots {
        *by_tier.entry(spot.rarity).or_insert(0) += 1;
    }

    let mut counts: Vec<RarityCount> = by_tier
        .into_iter()
        .map(|(rarity, count)| RarityCount { rarity, count })
        .collect();
    counts.sort_by_key(|c| Reverse(c.rarity));
    counts
}

/// A gamification milestone shown on the profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// `(current, goal)` for count-based achievements
    pub progress: Option<(u32, u32)>,
}

/// Everything the profile screen shows about a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileStats {
    pub total_spots: u32,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub first_spot_date: Option<DateTime<Utc>>,
    /// Spots of Diamond tier or above
    pub rare_finds: u32,
    pub rarity_counts: Vec<RarityCount>,
    pub collector: CollectorProgress,
    pub achievements: Vec<Achievement>,
}

impl ProfileStats {
    pub fn from_spots(spots: &[Spot]) -> Self {
        let total_spots = spots.len() as u32;
        let counts = rarity_counts(spots);
        let rare_finds = counts
            .iter()
            .filter(|c| c.rarity.is_rare())
            .map(|c| c.count)
            .sum();

        Self {
            total_spots,
            first_spot_date: spots.iter().map(|s| s.created_at).min(),
            rare_finds,
            collector: CollectorProgress::from_counts(&counts),
            achievements: achievements(total_spots, rare_finds),
            rarity_counts: counts,
        }
    }
}

fn achievements(total_spots: u32, rare_finds: u32) -> Vec<Achievement> {
    vec![
        Achievement {
            title: "First Spot".to_string(),
            description: "Scan your first car".to_string(),
            completed: total_spots >= 1,
            progress: None,
        },
        Achievement {
            title: "Dedicated Spotter".to_string(),
            description: "Scan 10 different cars".to_string(),
            completed: total_spots >= DEDICATED_SPOTTER_GOAL,
            progress: Some((total_spots.min(DEDICATED_SPOTTER_GOAL), DEDICATED_SPOTTER_GOAL)),
        },
        Achievement {
            title: "Rare Hunter".to_string(),
            description: "Find a Diamond or higher rarity car".to_string(),
            completed: rare_finds > 0,
            progress: None,
        },
    ]
}
