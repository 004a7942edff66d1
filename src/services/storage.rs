// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Storage client for post images.

use crate::error::AppError;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Object storage client bound to one bucket.
#[derive(Clone)]
pub struct StorageService {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
}

impl StorageService {
    pub fn new(base_url: String, bucket: String) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed building storage client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url,
            bucket,
        })
    }

    /// Upload a JPEG under `{prefix}/{uuid}.jpg` and return its public URL.
    ///
    /// The user's ID token authorizes the write against the bucket's rules.
    pub async fn upload_image(
        &self,
        bytes: Vec<u8>,
        prefix: &str,
        id_token: &str,
    ) -> Result<String, AppError> {
        let path = format!("{}/{}.jpg", prefix, uuid::Uuid::new_v4());
        let url = format!(
            "{}/o?uploadType=media&name={}",
            self.bucket_url(),
            urlencoding::encode(&path)
        );

        let size = bytes.len();
        let response = self
            .http
            .post(&url)
            .bearer_auth(id_token)
            .header(reqwest::header::CONTENT_TYPE, JPEG_CONTENT_TYPE)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Upload request failed: {}", e)))?;

        check_response(response).await?;

        tracing::info!(path = %path, bytes = size, "Image uploaded");
        Ok(self.public_url(&path))
    }

    /// Publicly resolvable download URL for an object path.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/o/{}?alt=media",
            self.bucket_url(),
            urlencoding::encode(path)
        )
    }

    /// Recover the object path from a URL produced by [`Self::public_url`].
    ///
    /// Returns `None` for URLs outside this bucket.
    pub fn object_path_from_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/o/", self.bucket_url());
        let encoded = url.strip_prefix(&prefix)?;
        let encoded = encoded.split(['?', '#']).next()?;
        if encoded.is_empty() {
            return None;
        }
        urlencoding::decode(encoded).ok().map(|p| p.into_owned())
    }

    /// Delete an object given its public URL.
    pub async fn delete_image_by_url(&self, url: &str, id_token: &str) -> Result<(), AppError> {
        let path = self
            .object_path_from_url(url)
            .ok_or_else(|| AppError::Storage(format!("Invalid image URL format: {}", url)))?;

        let delete_url = format!("{}/o/{}", self.bucket_url(), urlencoding::encode(&path));
        let response = self
            .http
            .delete(&delete_url)
            .bearer_auth(id_token)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Delete request failed: {}", e)))?;

        // Already gone is fine.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(path = %path, "Image already deleted");
            return Ok(());
        }

        check_response(response).await?;
        tracing::info!(path = %path, "Image deleted");
        Ok(())
    }

    fn bucket_url(&self) -> String {
        format!("{}/b/{}", self.base_url, self.bucket)
    }
}

async fn check_response(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Storage(format!("HTTP {}: {}", status, body)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> StorageService {
        StorageService::new(
            "https://firebasestorage.googleapis.com/v0".to_string(),
            "spottr.appspot.com".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_public_url_encodes_path() {
        let url = service().public_url("posts/abc.jpg");
        assert_eq!(
            url,
            "https://firebasestorage.googleapis.com/v0/b/spottr.appspot.com/o/posts%2Fabc.jpg?alt=media"
        );
    }

    #[test]
    fn test_object_path_round_trip() {
        let storage = service();
        let url = storage.public_url("posts/0b9d1c.jpg");
        assert_eq!(
            storage.object_path_from_url(&url).as_deref(),
            Some("posts/0b9d1c.jpg")
        );
    }

    #[test]
    fn test_object_path_rejects_foreign_urls() {
        let storage = service();
        assert_eq!(
            storage.object_path_from_url(
                "https://firebasestorage.googleapis.com/v0/b/other.appspot.com/o/posts%2Fx.jpg?alt=media"
            ),
            None
        );
        assert_eq!(
            storage.object_path_from_url("https://example.com/posts/x.jpg"),
            None
        );
        assert_eq!(
            storage.object_path_from_url(
                "https://firebasestorage.googleapis.com/v0/b/spottr.appspot.com/o/?alt=media"
            ),
            None
        );
    }
}
