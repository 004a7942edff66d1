// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! RevenueCat client for offerings, receipts and the pro entitlement.
//!
//! Only iOS purchases are wired up; requests for other platforms return
//! `None` without touching the network.

use crate::error::AppError;
use crate::models::purchase::{Package, PRO_ENTITLEMENT};
use crate::models::{Offering, Platform, PurchaseOutcome};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// How long a fetched entitlement stays valid in memory.
const ENTITLEMENT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Copy)]
pub struct CachedEntitlement {
    is_pro: bool,
    cached_at: Instant,
}

/// Shared entitlement cache type for use in AppState.
impl CachedEntitlement {
    fn is_stale(&self) -> bool {
        self.cached_at.elapsed() >= ENTITLEMENT_CACHE_TTL
    }
}

pub type EntitlementCache = Arc<DashMap<String, CachedEntitlement>>;

/// RevenueCat REST client with an in-memory entitlement cache.
#[derive(Clone)]
pub struct PurchasesService {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: EntitlementCache,
}

impl PurchasesService {
    pub fn new(base_url: String, api_key: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed building purchases client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url,
            api_key,
            cache: Arc::new(DashMap::new()),
        })
    }

    /// The current offering for a user, or `None` on gated platforms.
    pub async fn get_offerings(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<Offering>, AppError> {
        if !platform.purchases_enabled() {
            tracing::debug!(?platform, "Purchases disabled on platform");
            return Ok(None);
        }

        let url = format!(
            "{}/subscribers/{}/offerings",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("X-Platform", platform.header_value())
            .send()
            .await
            .map_err(|e| AppError::Purchases(e.to_string()))?;

        let offerings: OfferingsResponse = check_response_json(response).await?;
        Ok(offerings.current())
    }

    /// Post a store receipt and report whether it unlocked pro.
    pub async fn purchase(
        &self,
        user_id: &str,
        platform: Platform,
        product_id: &str,
        fetch_token: &str,
    ) -> Result<Option<PurchaseOutcome>, AppError> {
        if !platform.purchases_enabled() {
            tracing::debug!(?platform, "Purchases disabled on platform");
            return Ok(None);
        }

        let url = format!("{}/receipts", self.base_url);
        let body = serde_json::json!({
            "app_user_id": user_id,
            "fetch_token": fetch_token,
            "product_id": product_id,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Platform", platform.header_value())
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Purchases(e.to_string()))?;

        let subscriber: SubscriberResponse = check_response_json(response).await?;
        let is_pro = subscriber.subscriber.has_active(PRO_ENTITLEMENT, Utc::now());
        self.set_cached(user_id, is_pro);

        tracing::info!(user_id, product_id, is_pro, "Purchase completed");

        Ok(Some(PurchaseOutcome {
            is_pro,
            product_identifier: product_id.to_string(),
        }))
    }

    /// Whether the user holds an active pro entitlement.
    pub async fn is_pro(&self, user_id: &str) -> Result<bool, AppError> {
        if let Some(is_pro) = self.cached(user_id) {
            return Ok(is_pro);
        }

        let url = format!(
            "{}/subscribers/{}",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Purchases(e.to_string()))?;

        let subscriber: SubscriberResponse = check_response_json(response).await?;
        let is_pro = subscriber.subscriber.has_active(PRO_ENTITLEMENT, Utc::now());
        self.set_cached(user_id, is_pro);
        Ok(is_pro)
    }

    /// Cached entitlement if still fresh.
    pub fn cached(&self, user_id: &str) -> Option<bool> {
        self.cache.remove_if(user_id, |_, entry| entry.is_stale());
        self.cache.get(user_id).map(|entry| entry.is_pro)
    }

    /// Record an entitlement, e.g. from a webhook.
    ///
    /// Stale entries of other users are swept at the same time.
    pub fn set_cached(&self, user_id: &str, is_pro: bool) {
        self.cache.retain(|_, entry| !entry.is_stale());
        self.cache.insert(
            user_id.to_string(),
            CachedEntitlement {
                is_pro,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop a user's cached entitlement.
    pub fn invalidate(&self, user_id: &str) {
        self.cache.remove(user_id);
    }
}

async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.as_u16() == 429 {
            tracing::warn!("RevenueCat rate limit hit (429)");
            return Err(AppError::Purchases("Rate limit exceeded".to_string()));
        }

        return Err(AppError::Purchases(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Purchases(format!("JSON parse error: {}", e)))
}

// ─── Webhook Events ──────────────────────────────────────────────

/// Body of a RevenueCat webhook delivery.
#[derive(Debug, Deserialize)]
pub struct WebhookBody {
    pub event: WebhookEvent,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub app_user_id: String,
    #[serde(default)]
    pub entitlement_ids: Option<Vec<String>>,
    pub expiration_at_ms: Option<i64>,
}

impl WebhookEvent {
    /// New pro state implied by this event, if it changes anything.
    pub fn pro_state(&self, now: DateTime<Utc>) -> Option<bool> {
        let grants_pro = self
            .entitlement_ids
            .as_ref()
            .is_some_and(|ids| ids.iter().any(|id| id == PRO_ENTITLEMENT));

        match self.event_type.as_str() {
            "INITIAL_PURCHASE" | "RENEWAL" | "UNCANCELLATION" | "PRODUCT_CHANGE"
            | "NON_RENEWING_PURCHASE" => {
                if !grants_pro {
                    return None;
                }
                let active = self
                    .expiration_at_ms
                    .and_then(DateTime::<Utc>::from_timestamp_millis)
                    .is_none_or(|expires| expires > now);
                Some(active)
            }
            "EXPIRATION" => grants_pro.then_some(false),
            // Cancellation keeps access until expiration.
            _ => None,
        }
    }
}

// ─── Wire Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OfferingsResponse {
    current_offering_id: Option<String>,
    #[serde(default)]
    offerings: Vec<WireOffering>,
}

impl OfferingsResponse {
    fn current(self) -> Option<Offering> {
        let current_id = self.current_offering_id?;
        self.offerings
            .into_iter()
            .find(|o| o.identifier == current_id)
            .map(|o| Offering {
                identifier: o.identifier,
                description: o.description,
                packages: o
                    .packages
                    .into_iter()
                    .map(|p| Package {
                        identifier: p.identifier,
                        product_identifier: p.platform_product_identifier,
                    })
                    .collect(),
            })
    }
}

#[derive(Debug, Deserialize)]
struct WireOffering {
    identifier: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    packages: Vec<WirePackage>,
}

#[derive(Debug, Deserialize)]
struct WirePackage {
    identifier: String,
    platform_product_identifier: String,
}

#[derive(Debug, Deserialize)]
struct SubscriberResponse {
    subscriber: Subscriber,
}

#[derive(Debug, Deserialize)]
struct Subscriber {
    #[serde(default)]
    entitlements: HashMap<String, Entitlement>,
}

impl Subscriber {
    fn has_active(&self, entitlement: &str, now: DateTime<Utc>) -> bool {
        self.entitlements
            .get(entitlement)
            .is_some_and(|e| e.expires_date.is_none_or(|expires| expires > now))
    }
}

#[derive(Debug, Deserialize)]
struct Entitlement {
    /// `null` for lifetime purchases
    expires_date: Option<DateTime<Utc>>,
}
