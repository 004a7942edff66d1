// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-app purchase models.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Entitlement that unlocks pro features.
pub const PRO_ENTITLEMENT: &str = "pro_features";

/// Client platform making a purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum Platform {
    Ios,
    Android,
    Web,
}

impl Platform {
    /// Purchases are only wired up for iOS; other platforms are skipped.
    pub fn purchases_enabled(self) -> bool {
        matches!(self, Platform::Ios)
    }

    /// Value for the RevenueCat `X-Platform` header.
    pub fn header_value(self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Web => "stripe",
        }
    }
}

/// A purchasable package within an offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Package {
    pub identifier: String,
    pub product_identifier: String,
}

/// The currently active offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Offering {
    pub identifier: String,
    pub description: String,
    pub packages: Vec<Package>,
}

/// Outcome of a completed purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PurchaseOutcome {
    pub is_pro: bool,
    pub product_identifier: String,
}
