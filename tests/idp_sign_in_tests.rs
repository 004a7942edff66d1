// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Apple/Google sign-in against a local Identity Toolkit fake.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use carspottr::config::Config;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

fn identity_idp(_: &Method, path: &str) -> (StatusCode, Value) {
    match path {
        "/accounts:signInWithIdp" => (
            StatusCode::OK,
            json!({
                "localId": "apple-user-1",
                "email": "hidden@privaterelay.appleid.com",
                "idToken": "firebase-id-token",
                "refreshToken": "refresh",
                "expiresIn": "3600",
                "isNewUser": true
            }),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            json!({"error": {"code": 404, "message": "NOT_FOUND"}}),
        ),
    }
}

#[tokio::test]
async fn test_idp_sign_in_sets_session() {
    let identity = common::spawn_fake_upstream(identity_idp).await;
    let mut config = Config::test_default();
    config.identity_base_url = identity.base_url.clone();
    let (app, _) = common::create_test_app_with(config, common::test_db_offline());

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/idp")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"provider": "Apple", "id_token": "apple-jwt", "nonce": "raw"})
                        .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.contains("firebase-id-token"), "got: {cookie}");

    let body = common::body_json(response).await;
    assert_eq!(body["user_id"], "apple-user-1");
    assert_eq!(body["expires_in"], 3600);

    // No profile is written on sign-in, so the offline database is never hit.
    assert_eq!(identity.received(), vec!["POST /accounts:signInWithIdp".to_string()]);
}
