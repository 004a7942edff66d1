// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod analysis;
pub mod collection;
pub mod post;
pub mod profile;
pub mod progress;
pub mod purchase;
pub mod rarity;
pub mod spot;
pub mod stats;

pub use analysis::{parse_analysis, CarAnalysis};
pub use collection::{query_collection, SortOrder};
pub use post::{FeedEvent, FeedPost, Post};
pub use profile::Profile;
pub use progress::CollectorProgress;
pub use purchase::{Offering, Platform, PurchaseOutcome};
pub use rarity::RarityTier;
pub use spot::Spot;
pub use stats::{rarity_counts, ProfileStats, RarityCount};
