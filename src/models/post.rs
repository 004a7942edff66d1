// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Social feed posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Stored post record in Firestore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Post ID (also used as document ID)
    pub id: String,
    /// Author's auth uid
    pub user_id: String,
    pub content: String,
    /// Optional title line
    pub subject: Option<String>,
    /// Public URL of the attached image
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Post as shown in the feed, joined with its author's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FeedPost {
    pub id: String,
    pub user_id: String,
    pub author_name: String,
    pub content: String,
    pub subject: Option<String>,
    pub image_url: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl FeedPost {
    pub fn new(post: Post, author_name: impl Into<String>) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            author_name: author_name.into(),
            content: post.content,
            subject: post.subject,
            image_url: post.image_url,
            created_at: post.created_at,
        }
    }
}

/// A change to the posts collection, pushed to feed subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    PostCreated { post: FeedPost },
    PostDeleted { post_id: String },
}

impl FeedEvent {
    /// SSE event name.
    pub fn name(&self) -> &'static str {
        match self {
            FeedEvent::PostCreated { .. } => "post_created",
            FeedEvent::PostDeleted { .. } => "post_deleted",
        }
    }
}
