// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! ID token authentication middleware.

use crate::services::TokenError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// Cookie holding the web client's ID token.
pub const SESSION_COOKIE: &str = "carspottr_token";

/// Authenticated user extracted from a verified ID token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    /// The raw token, forwarded to services that act as the user
    pub id_token: String,
}

/// Middleware that requires a valid Firebase ID token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = session_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let verified = state
        .token_verifier
        .verify(&token)
        .await
        .map_err(|e| match e {
            TokenError::Invalid(reason) => {
                tracing::debug!(reason = %reason, "Rejected ID token");
                StatusCode::UNAUTHORIZED
            }
            TokenError::Transient(reason) => {
                tracing::error!(reason = %reason, "ID token verification unavailable");
                StatusCode::SERVICE_UNAVAILABLE
            }
        })?;

    request.extensions_mut().insert(AuthUser {
        user_id: verified.user_id,
        email: verified.email,
        id_token: token,
    });

    Ok(next.run(request).await)
}

/// Cookie first, then `Authorization: Bearer`.
fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string()).filter(|t| !t.is_empty());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
