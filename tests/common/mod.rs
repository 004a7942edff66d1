// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use carspottr::config::Config;
use carspottr::db::FirestoreDb;
use carspottr::routes::create_router;
use carspottr::services::FirebaseTokenVerifier;
use carspottr::AppState;
use axum::http::{Method, StatusCode, Uri};
use axum::{Json, Router};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Key ID the static test verifier trusts.
#[allow(dead_code)]
pub const TEST_KID: &str = "test-kid";

const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/test_rsa_private.pem");
const TEST_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/test_rsa_public.pem");

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), test_db_offline())
}

/// Create a test app over the given config and database.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let decoding_key =
        DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY).expect("valid test public key");
    let verifier = FirebaseTokenVerifier::new_with_static_key(
        &config.firebase_project_id,
        TEST_KID,
        decoding_key,
    )
    .expect("static verifier");

    let state = Arc::new(AppState::new(config, db, Arc::new(verifier)).expect("app state"));

    (create_router(state.clone()), state)
}

/// Canned reply of a fake upstream API for a method and path.
#[allow(dead_code)]
pub type UpstreamReply = fn(&Method, &str) -> (StatusCode, serde_json::Value);

/// A local HTTP server standing in for an external API.
#[allow(dead_code)]
pub struct FakeUpstream {
    pub base_url: String,
    /// `"METHOD /path"` of every request received, in order
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl FakeUpstream {
    pub fn received(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Start a fake upstream API on an ephemeral port.
#[allow(dead_code)]
pub async fn spawn_fake_upstream(reply: UpstreamReply) -> FakeUpstream {
    let requests: Arc<Mutex<Vec<String>>> = Arc::default();
    let log = requests.clone();

    let app = Router::new().fallback(move |method: Method, uri: Uri| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{} {}", method, uri.path()));
            let (status, body) = reply(&method, uri.path());
            (status, Json(body))
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream");
    });

    FakeUpstream {
        base_url: format!("http://{}", addr),
        requests,
    }
}

#[derive(Serialize)]
struct TestClaims<'a> {
    iss: String,
    aud: &'a str,
    sub: &'a str,
    iat: u64,
    exp: u64,
    email: &'a str,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// Sign an ID token for `user_id` that the test app accepts.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, config: &Config) -> String {
    sign_test_jwt(user_id, &config.firebase_project_id, TEST_KID, 3600)
}

/// Sign an ID token with explicit audience, key ID and lifetime.
#[allow(dead_code)]
pub fn sign_test_jwt(user_id: &str, project_id: &str, kid: &str, lifetime_secs: i64) -> String {
    let now = now_secs();
    let claims = TestClaims {
        iss: format!("https://securetoken.google.com/{}", project_id),
        aud: project_id,
        sub: user_id,
        iat: now,
        exp: (now as i64 + lifetime_secs) as u64,
        email: "driver@example.com",
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());

    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).expect("valid test private key"),
    )
    .expect("signed test token")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
