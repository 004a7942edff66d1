// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - external API clients and live feed.

pub mod feed;
pub mod id_token;
pub mod identity;
pub mod purchases;
pub mod storage;
pub mod vision;

pub use feed::{FeedBroadcaster, FeedSubscription};
pub use id_token::{FirebaseTokenVerifier, TokenError, VerifiedUser};
pub use identity::{IdentityProvider, IdentityService, Session};
pub use purchases::PurchasesService;
pub use storage::StorageService;
pub use vision::VisionService;
