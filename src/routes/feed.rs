// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social feed routes, including the live event stream.

use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::profile::ANONYMOUS_NAME;
use crate::models::{FeedEvent, FeedPost, Post};
use crate::services::vision::validate_image_base64;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Longest accepted post body, in characters.
const MAX_CONTENT_CHARS: usize = 2000;
const MAX_SUBJECT_CHARS: usize = 200;
/// Storage folder for post images.
const POST_IMAGE_PREFIX: &str = "posts";
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// Feed routes (require authentication).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route("/api/posts/stream", get(stream_posts))
        .route("/api/posts/{id}", delete(delete_post))
}

// ─── List ────────────────────────────────────────────────────

/// All posts, newest first, with author names.
///
/// Opening the feed gives the caller an anonymous profile if they have none.
async fn list_posts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FeedPost>>> {
    state.db.ensure_profile(&user.user_id).await?;
    let posts = state.db.list_posts().await?;

    let author_ids: Vec<String> = posts
        .iter()
        .map(|p| p.user_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let profiles = state.db.get_profiles(&author_ids).await?;

    let feed = posts
        .into_iter()
        .map(|post| {
            let author = profiles
                .get(&post.user_id)
                .map(|p| p.author_name().to_string())
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
            FeedPost::new(post, author)
        })
        .collect();

    Ok(Json(feed))
}

// ─── Create ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
    pub subject: Option<String>,
    /// Base64 JPEG, optionally as a `data:` URL
    pub image_base64: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CreatePostResponse {
    pub post: FeedPost,
    /// The post was created but its image could not be stored
    pub image_upload_failed: bool,
}

/// Checked and normalized post input.
#[derive(Debug, PartialEq)]
struct NewPost {
    content: String,
    subject: Option<String>,
    image: Option<Vec<u8>>,
}

fn validate_post(req: CreatePostRequest) -> Result<NewPost> {
    let content = req.content.trim().to_string();
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(AppError::BadRequest(format!(
            "Post must be at most {} characters",
            MAX_CONTENT_CHARS
        )));
    }

    let subject = req
        .subject
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if subject
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_SUBJECT_CHARS)
    {
        return Err(AppError::BadRequest(format!(
            "Subject must be at most {} characters",
            MAX_SUBJECT_CHARS
        )));
    }

    let image = match req.image_base64.as_deref().filter(|i| !i.trim().is_empty()) {
        Some(raw) => {
            let payload = validate_image_base64(raw)?;
            let bytes = STANDARD
                .decode(payload)
                .map_err(|_| AppError::BadRequest("Image is not valid base64".to_string()))?;
            Some(bytes)
        }
        None => None,
    };

    if content.is_empty() && image.is_none() {
        return Err(AppError::BadRequest("Post needs text or an image".to_string()));
    }

    Ok(NewPost {
        content,
        subject,
        image,
    })
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<CreatePostResponse>)> {
    let new_post = validate_post(req)?;

    let mut image_upload_failed = false;
    let image_url = match new_post.image {
        Some(bytes) => match state
            .storage
            .upload_image(bytes, POST_IMAGE_PREFIX, &user.id_token)
            .await
        {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, error = %e, "Image upload failed, posting without image");
                image_upload_failed = true;
                None
            }
        },
        None => None,
    };

    let post = Post {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id.clone(),
        content: new_post.content,
        subject: new_post.subject,
        image_url,
        created_at: chrono::Utc::now(),
    };
    if let Err(e) = state.db.create_post(&post).await {
        if let Some(url) = &post.image_url {
            discard_image(&state, url, &user.id_token).await;
        }
        return Err(e);
    }

    let author = state.db.ensure_profile(&user.user_id).await?;
    let feed_post = FeedPost::new(post, author.author_name());

    tracing::info!(user_id = %user.user_id, post_id = %feed_post.id, "Post created");
    state.feed.publish(FeedEvent::PostCreated {
        post: feed_post.clone(),
    });

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            post: feed_post,
            image_upload_failed,
        }),
    ))
}

// ─── Delete ──────────────────────────────────────────────────

/// Delete one of the caller's posts.
async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<String>,
) -> Result<StatusCode> {
    let post = state
        .db
        .get_post(&post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

    if post.user_id != user.user_id {
        tracing::warn!(user_id = %user.user_id, post_id = %post_id, "Attempt to delete another user's post");
        return Err(AppError::Forbidden("Not your post".to_string()));
    }

    state.db.delete_post(&post_id).await?;

    if let Some(url) = &post.image_url {
        discard_image(&state, url, &user.id_token).await;
    }

    state.feed.publish(FeedEvent::PostDeleted {
        post_id: post_id.clone(),
    });
    tracing::info!(user_id = %user.user_id, post_id = %post_id, "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Best-effort removal of a post image.
async fn discard_image(state: &AppState, url: &str, id_token: &str) {
    if let Err(e) = state.storage.delete_image_by_url(url, id_token).await {
        tracing::warn!(url = %url, error = %e, "Failed to delete post image");
    }
}

// ─── Live Stream ─────────────────────────────────────────────

/// Server-sent feed changes. Closing the connection unsubscribes.
async fn stream_posts(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let subscription = state.feed.subscribe();
    tracing::info!(
        user_id = %user.user_id,
        subscribers = state.feed.subscriber_count(),
        "Feed stream opened"
    );

    Sse::new(subscription.into_sse_stream()).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content: &str, image: Option<&str>) -> CreatePostRequest {
        CreatePostRequest {
            content: content.to_string(),
            subject: None,
            image_base64: image.map(String::from),
        }
    }

    #[test]
    fn test_post_needs_content_or_image() {
        assert!(matches!(
            validate_post(request("   ", None)),
            Err(AppError::BadRequest(_))
        ));

        let image = STANDARD.encode(b"jpeg bytes");
        let post = validate_post(request("", Some(&image))).unwrap();
        assert_eq!(post.image.as_deref(), Some(&b"jpeg bytes"[..]));
        assert!(post.content.is_empty());
    }

    #[test]
    fn test_post_length_limit_counts_chars() {
        // Multi-byte characters count once.
        assert!(validate_post(request(&"🚗".repeat(MAX_CONTENT_CHARS), None)).is_ok());
        assert!(validate_post(request(&"a".repeat(MAX_CONTENT_CHARS + 1), None)).is_err());
    }

    #[test]
    fn test_post_rejects_bad_image() {
        assert!(validate_post(request("hi", Some("not base64!!"))).is_err());
    }

    #[test]
    fn test_post_normalizes_subject() {
        let mut req = request(" Spotted downtown ", None);
        req.subject = Some("  ".to_string());
        let post = validate_post(req).unwrap();
        assert_eq!(post.content, "Spotted downtown");
        assert_eq!(post.subject, None);
    }
}
