// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for RevenueCat entitlement events.

use crate::services::purchases::WebhookBody;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook/revenuecat", post(handle_event))
}

/// Compare the Authorization header to the shared secret in constant time.
///
/// RevenueCat sends the configured value verbatim; a `Bearer ` prefix is
/// also accepted.
fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let presented = value.strip_prefix("Bearer ").unwrap_or(value);
    !secret.is_empty() && bool::from(presented.as_bytes().ct_eq(secret.as_bytes()))
}

/// Handle an incoming webhook event (POST).
///
/// A non-2xx status makes RevenueCat retry, so only storage failures return one.
async fn handle_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !is_authorized(&headers, &state.config.purchases_webhook_secret) {
        tracing::warn!("Security Alert: RevenueCat webhook with invalid authorization");
        return StatusCode::UNAUTHORIZED;
    }

    let event = match serde_json::from_slice::<WebhookBody>(&body) {
        Ok(body) => body.event,
        Err(e) => {
            tracing::error!(error = %e, "Failed to parse webhook event");
            return StatusCode::BAD_REQUEST;
        }
    };

    tracing::info!(
        event_type = %event.event_type,
        user_id = %event.app_user_id,
        "Webhook event received"
    );

    let Some(is_pro) = event.pro_state(chrono::Utc::now()) else {
        tracing::debug!(event_type = %event.event_type, "Webhook event ignored");
        return StatusCode::OK;
    };

    state.purchases.set_cached(&event.app_user_id, is_pro);

    match state.db.set_profile_pro(&event.app_user_id, is_pro).await {
        Ok(()) => {
            tracing::info!(user_id = %event.app_user_id, is_pro, "Entitlement updated");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(user_id = %event.app_user_id, error = %e, "Failed to store entitlement");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(auth: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(auth));
        headers
    }

    #[test]
    fn test_is_authorized() {
        assert!(is_authorized(&headers("hook-secret"), "hook-secret"));
        assert!(is_authorized(&headers("Bearer hook-secret"), "hook-secret"));
        assert!(!is_authorized(&headers("hook-secreT"), "hook-secret"));
        assert!(!is_authorized(&headers("hook"), "hook-secret"));
        assert!(!is_authorized(&HeaderMap::new(), "hook-secret"));
        assert!(!is_authorized(&headers(""), ""));
    }
}
