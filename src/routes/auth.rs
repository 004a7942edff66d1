// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication routes: email/password and Apple/Google sign-in.
//!
//! Sessions are Firebase ID tokens. Web clients get them as an HttpOnly
//! cookie; native clients use the JSON body and send a Bearer header.

use crate::error::{AppError, Result};
use crate::middleware::SESSION_COOKIE;
use crate::models::Profile;
use crate::services::{IdentityProvider, Session};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Auth routes (public).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/idp", post(sign_in_with_idp))
        .route("/auth/refresh", post(refresh))
        .route("/auth/signout", post(sign_out))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters"))]
    pub password: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IdpSignInRequest {
    /// `apple` or `google`
    pub provider: String,
    /// ID token issued to the app by the provider
    #[validate(length(min = 1, message = "Provider token is required"))]
    pub id_token: String,
    /// Raw nonce the Apple token was requested with
    pub nonce: Option<String>,
}

impl IdpSignInRequest {
    fn identity_provider(&self) -> Result<IdentityProvider> {
        IdentityProvider::from_name(&self.provider).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported sign-in provider: {}", self.provider))
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Session returned after authentication.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub expires_in: u64,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        Self {
            user_id: s.user_id,
            email: s.email,
            id_token: s.id_token,
            refresh_token: s.refresh_token,
            expires_in: s.expires_in,
        }
    }
}

/// Build the HttpOnly session cookie for an ID token.
pub(crate) fn session_cookie(id_token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id_token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Profile written at sign-up. An unnamed user stays unnamed; views apply their own default.
fn signup_profile(user_id: &str, full_name: Option<String>, now: &str) -> Profile {
    let full_name = full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Profile::new(user_id, full_name, now)
}

/// Create an account and its profile.
async fn sign_up(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignUpRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let session = state.identity.sign_up(req.email.trim(), &req.password).await?;

    let now = format_utc_rfc3339(chrono::Utc::now());
    let profile = signup_profile(&session.user_id, req.full_name, &now);

    // The auth account exists either way; a missing profile is recreated on first read.
    if let Err(e) = state.db.upsert_profile(&profile).await {
        tracing::error!(user_id = %session.user_id, error = %e, "Failed to create profile");
    }

    tracing::info!(user_id = %session.user_id, "User signed up");

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let session = state.identity.sign_in(req.email.trim(), &req.password).await?;
    tracing::info!(user_id = %session.user_id, "User signed in");

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

/// Apple or Google sign-in. The account is created on first use; its profile
/// is created lazily like any other unnamed user.
async fn sign_in_with_idp(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<IdpSignInRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;
    let provider = req.identity_provider()?;

    let session = state
        .identity
        .sign_in_with_idp(provider, &req.id_token, req.nonce.as_deref())
        .await?;

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RefreshRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let session = state.identity.refresh(&req.refresh_token).await?;

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

/// Clear the session cookie. Native clients just discard their tokens.
async fn sign_out(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
