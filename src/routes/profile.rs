// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Profile and account management routes.

use crate::error::{AppError, Result};
use crate::middleware::{AuthUser, SESSION_COOKIE};
use crate::models::profile::DEFAULT_PROFILE_NAME;
use crate::models::{FeedEvent, Profile, ProfileStats, Spot};
use crate::routes::auth::{session_cookie, SessionResponse};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Confirmation phrase required to delete an account.
const DELETE_CONFIRMATION: &str = "DELETE";

/// Profile routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profile", get(get_profile).put(update_profile))
        .route("/api/account", delete(delete_account))
        .route("/api/account/email", put(update_email))
        .route("/api/account/password", put(update_password))
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileResponse {
    pub user_id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub is_pro: bool,
    pub stats: ProfileStats,
}

/// Current user's profile with collection statistics.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state.db.get_profile(&user.user_id).await?;
    let spots = state.db.get_spots_for_user(&user.user_id).await?;

    Ok(Json(profile_response(user, profile.as_ref(), &spots)))
}

/// Viewing a profile never creates one; a missing profile shows the defaults.
fn profile_response(user: AuthUser, profile: Option<&Profile>, spots: &[Spot]) -> ProfileResponse {
    ProfileResponse {
        full_name: profile
            .map_or(DEFAULT_PROFILE_NAME, Profile::display_name)
            .to_string(),
        is_pro: profile.is_some_and(|p| p.is_pro),
        user_id: user.user_id,
        email: user.email,
        stats: ProfileStats::from_spots(spots),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub full_name: String,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(mut req): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    req.full_name = req.full_name.trim().to_string();
    req.validate()?;

    let now = format_utc_rfc3339(chrono::Utc::now());
    let mut profile = state
        .db
        .get_profile(&user.user_id)
        .await?
        .unwrap_or_else(|| Profile::new(&user.user_id, None, &now));
    profile.full_name = Some(req.full_name);
    profile.updated_at = now;
    state.db.upsert_profile(&profile).await?;

    tracing::info!(user_id = %user.user_id, "Profile updated");
    Ok(Json(profile))
}

// ─── Account ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateEmailRequest {
    #[validate(email(message = "Email address is invalid"))]
    pub new_email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters"))]
    pub new_password: String,
    #[validate(must_match(other = "new_password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub confirm: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted_documents: usize,
}

/// Re-check the user's password and return a fresh ID token.
///
/// Sensitive changes require recent sign-in on the auth provider.
async fn reauthenticate(state: &AppState, user: &AuthUser, password: &str) -> Result<String> {
    let email = user
        .email
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Account has no email address".to_string()))?;

    let session = state.identity.sign_in(email, password).await?;
    if session.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Credentials belong to another account".to_string(),
        ));
    }
    Ok(session.id_token)
}

async fn update_email(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let id_token = reauthenticate(&state, &user, &req.password).await?;
    let session = state
        .identity
        .update_email(&id_token, req.new_email.trim())
        .await?;

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

async fn update_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Json(req): Json<UpdatePasswordRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let id_token = reauthenticate(&state, &user, &req.current_password).await?;
    let session = state
        .identity
        .update_password(&id_token, &req.new_password)
        .await?;

    let jar = jar.add(session_cookie(session.id_token.clone()));
    Ok((jar, Json(session.into())))
}

/// Delete the account, its spots, posts and profile.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    Json(req): Json<DeleteAccountRequest>,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    req.validate()?;
    if req.confirm != DELETE_CONFIRMATION {
        return Err(AppError::BadRequest(format!(
            "Type {} to confirm",
            DELETE_CONFIRMATION
        )));
    }

    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    let id_token = reauthenticate(&state, &user, &req.password).await?;

    // Auth account first, so a provider failure leaves the user's data untouched.
    state.identity.delete_account(&id_token).await?;
    state.purchases.invalidate(&user.user_id);

    let deleted = state.db.delete_user_data(&user.user_id).await.inspect_err(|e| {
        tracing::error!(
            user_id = %user.user_id,
            error = %e,
            "Auth account deleted but user data remains"
        );
    })?;

    // The ID token stays signed and unexpired, so storage still accepts it.
    for url in &deleted.image_urls {
        if let Err(e) = state.storage.delete_image_by_url(url, &id_token).await {
            tracing::warn!(error = %e, url = %url, "Failed to delete post image");
        }
    }
    for post_id in deleted.post_ids {
        state.feed.publish(FeedEvent::PostDeleted { post_id });
    }

    tracing::info!(
        user_id = %user.user_id,
        deleted_documents = deleted.documents,
        "Account deleted"
    );

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((
        jar,
        Json(DeleteAccountResponse {
            success: true,
            deleted_documents: deleted.documents,
        }),
    ))
}
