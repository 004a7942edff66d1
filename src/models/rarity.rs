// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Rarity tiers and their fixed strength order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One of the seven fixed rarity classifications, weakest first.
///
/// The derived `Ord` follows declaration order, so `Bronze < ... < Grandmaster`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum RarityTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
}

impl RarityTier {
    /// All tiers, weakest first.
    pub const ALL: [RarityTier; 7] = [
        RarityTier::Bronze,
        RarityTier::Silver,
        RarityTier::Gold,
        RarityTier::Platinum,
        RarityTier::Diamond,
        RarityTier::Master,
        RarityTier::Grandmaster,
    ];

    /// Strength rank, 1 (Bronze) through 7 (Grandmaster).
    pub fn rank(self) -> u8 {
        match self {
            RarityTier::Bronze => 1,
            RarityTier::Silver => 2,
            RarityTier::Gold => 3,
            RarityTier::Platinum => 4,
            RarityTier::Diamond => 5,
            RarityTier::Master => 6,
            RarityTier::Grandmaster => 7,
        }
    }

    /// Score weight used for collector progression.
    pub fn weight(self) -> u64 {
        match self {
            RarityTier::Bronze => 1,
            RarityTier::Silver => 2,
            RarityTier::Gold => 3,
            RarityTier::Platinum => 5,
            RarityTier::Diamond => 8,
            RarityTier::Master => 13,
            RarityTier::Grandmaster => 21,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RarityTier::Bronze => "Bronze",
            RarityTier::Silver => "Silver",
            RarityTier::Gold => "Gold",
            RarityTier::Platinum => "Platinum",
            RarityTier::Diamond => "Diamond",
            RarityTier::Master => "Master",
            RarityTier::Grandmaster => "Grandmaster",
        }
    }

    /// Diamond and above count as rare finds.
    pub fn is_rare(self) -> bool {
        self >= RarityTier::Diamond
    }

    /// Interpret a free-text rarity label from an analysis.
    ///
    /// Accepts an exact tier name or a label whose first word is one
    /// (`"Gold - high-performance variant"`), case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let first_word = label
            .split(|c: char| !c.is_alphanumeric())
            .find(|word| !word.is_empty())?;
        first_word.parse().ok()
    }
}

impl fmt::Display for RarityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no tier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rarity tier: {0}")]
pub struct UnknownRarity(pub String);

impl FromStr for RarityTier {
    type Err = UnknownRarity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        RarityTier::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRarity(s.to_string()))
    }
}
