// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Collection filtering and ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

use crate::models::{RarityTier, Spot};

/// Ordering applied to a collection listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Descending creation time
    #[default]
    Newest,
    /// Ascending creation time
    Oldest,
    /// Strongest tier first; equal tiers keep their input order
    Rarity,
}

/// Keep only spots of the tier named by `filter`.
///
/// `None` keeps everything. A filter that names no tier matches nothing.
pub fn filter_by_rarity(spots: Vec<Spot>, filter: Option<&str>) -> Vec<Spot> {
    let Some(filter) = filter else {
        return spots;
    };

    match filter.parse::<RarityTier>() {
        Ok(tier) => spots.into_iter().filter(|s| s.rarity == tier).collect(),
        Err(_) => Vec::new(),
    }
}

/// Sort spots in place. All orderings are stable.
pub fn sort_spots(spots: &mut [Spot], order: SortOrder) {
    match order {
        SortOrder::Newest => spots.sort_by_key(|s| Reverse(s.created_at)),
        SortOrder::Oldest => spots.sort_by_key(|s| s.created_at),
        SortOrder::Rarity => spots.sort_by_key(|s| Reverse(s.rarity.rank())),
    }
}

/// Filter then sort, as the collection view presents it.
pub fn query_collection(spots: Vec<Spot>, filter: Option<&str>, order: SortOrder) -> Vec<Spot> {
    let mut spots = filter_by_rarity(spots, filter);
    sort_spots(&mut spots, order);
    spots
}
