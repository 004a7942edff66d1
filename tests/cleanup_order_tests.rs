// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ordering of side effects when a write fails part way.
//!
//! External APIs are served by a local fake; the database is offline, so
//! every Firestore write fails.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use carspottr::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

const USER_ID: &str = "user-7";

fn storage_ok(_: &Method, _: &str) -> (StatusCode, Value) {
    (StatusCode::OK, json!({}))
}

fn session_for_user() -> Value {
    json!({
        "localId": USER_ID,
        "email": "driver@example.com",
        "idToken": "fresh-id-token",
        "refreshToken": "refresh",
        "expiresIn": "3600"
    })
}

fn identity_delete_fails(_: &Method, path: &str) -> (StatusCode, Value) {
    match path {
        "/accounts:signInWithPassword" => (StatusCode::OK, session_for_user()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": {"code": 500, "message": "INTERNAL_ERROR"}}),
        ),
    }
}

fn identity_ok(_: &Method, path: &str) -> (StatusCode, Value) {
    match path {
        "/accounts:signInWithPassword" => (StatusCode::OK, session_for_user()),
        _ => (StatusCode::OK, json!({})),
    }
}

fn authed(method: &str, uri: &str, config: &Config, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", common::create_test_jwt(USER_ID, config)),
        )
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_failed_post_write_removes_uploaded_image() {
    let storage = common::spawn_fake_upstream(storage_ok).await;
    let mut config = Config::test_default();
    config.storage_base_url = storage.base_url.clone();
    let (app, state) = common::create_test_app_with(config, common::test_db_offline());

    let response = app
        .oneshot(authed(
            "POST",
            "/api/posts",
            &state.config,
            json!({"content": "Spotted an F40", "image_base64": "/9j/4AAQSkZJRgABAQ=="}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let received = storage.received();
    assert_eq!(received.len(), 2, "got: {received:?}");
    assert_eq!(received[0], "POST /b/test-project.appspot.com/o");
    assert!(
        received[1].starts_with("DELETE /b/test-project.appspot.com/o/posts"),
        "got: {received:?}"
    );
}

#[tokio::test]
async fn test_account_deletion_stops_when_auth_delete_fails() {
    let identity = common::spawn_fake_upstream(identity_delete_fails).await;
    let mut config = Config::test_default();
    config.identity_base_url = identity.base_url.clone();
    let (app, state) = common::create_test_app_with(config, common::test_db_offline());

    let response = app
        .oneshot(authed(
            "DELETE",
            "/api/account",
            &state.config,
            json!({"password": "secret1", "confirm": "DELETE"}),
        ))
        .await
        .unwrap();

    // The provider error surfaces before the database is touched.
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "auth_provider_error");

    assert_eq!(
        identity.received(),
        vec![
            "POST /accounts:signInWithPassword".to_string(),
            "POST /accounts:delete".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_account_deletion_removes_auth_account_first() {
    let identity = common::spawn_fake_upstream(identity_ok).await;
    let mut config = Config::test_default();
    config.identity_base_url = identity.base_url.clone();
    let (app, state) = common::create_test_app_with(config, common::test_db_offline());
    state.purchases.set_cached(USER_ID, true);

    let response = app
        .oneshot(authed(
            "DELETE",
            "/api/account",
            &state.config,
            json!({"password": "secret1", "confirm": "DELETE"}),
        ))
        .await
        .unwrap();

    // The auth account is gone; the offline database then fails.
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(identity
        .received()
        .contains(&"POST /accounts:delete".to_string()));
    assert_eq!(state.purchases.cached(USER_ID), None);
}
