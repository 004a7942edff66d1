// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collector progression: weighted score, level and progress toward the next level.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::RarityCount;

/// A level threshold and the title earned on reaching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub threshold: u64,
    pub title: &'static str,
}

/// Level table, ascending by threshold.
pub const LEVELS: [Level; 8] = [
    Level { threshold: 0, title: "Beginner" },
    Level { threshold: 10, title: "Novice Spotter" },
    Level { threshold: 25, title: "Car Enthusiast" },
    Level { threshold: 50, title: "Dedicated Collector" },
    Level { threshold: 100, title: "Automotive Expert" },
    Level { threshold: 200, title: "Master Collector" },
    Level { threshold: 350, title: "Legendary Spotter" },
    Level { threshold: 500, title: "Car Whisperer" },
];

/// Derived collector level for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CollectorProgress {
    /// 0 with no spots, otherwise 1-indexed position in [`LEVELS`]
    pub level: u32,
    pub title: String,
    /// Percent of the way from the current threshold to the next, in [0, 100]
    pub progress: f64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub score: u64,
}

/// Weighted score: sum of count × tier weight.
pub fn collector_score(counts: &[RarityCount]) -> u64 {
    counts
        .iter()
        .map(|c| u64::from(c.count) * c.rarity.weight())
        .sum()
}

impl CollectorProgress {
    /// Compute progression from per-tier counts.
    ///
    /// With no spots at all the level is 0 rather than 1. At or beyond the
    /// last threshold there is no next level, so progress is reported as 100.
    pub fn from_counts(counts: &[RarityCount]) -> Self {
        let total_spots: u64 = counts.iter().map(|c| u64::from(c.count)).sum();
        if total_spots == 0 {
            return Self {
                level: 0,
                title: LEVELS[0].title.to_string(),
                progress: 0.0,
                score: 0,
            };
        }

        let score = collector_score(counts);
        let index = LEVELS
            .iter()
            .rposition(|l| l.threshold <= score)
            .unwrap_or(0);
        let current = LEVELS[index];

        let progress = match LEVELS.get(index + 1) {
            Some(next) => {
                let span = (next.threshold - current.threshold) as f64;
                let gained = (score - current.threshold) as f64;
                (gained / span * 100.0).clamp(0.0, 100.0)
            }
            None => 100.0,
        };

        Self {
            level: index as u32 + 1,
            title: current.title.to_string(),
            progress,
            score,
        }
    }
}
