//! Application configuration loaded from environment variables.
//!
//! Secrets (API keys, webhook secret) are injected as environment variables
//! by the deployment and read once at startup.

use std::env;

const DEFAULT_VISION_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_VISION_MODEL: &str = "gpt-4o";
const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_SECURE_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com/v0";
const DEFAULT_PURCHASES_BASE_URL: &str = "https://api.revenuecat.com/v1";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Firebase / GCP project ID (ID token audience, Firestore project)
    pub firebase_project_id: String,
    /// Firebase Storage bucket for uploaded images
    pub storage_bucket: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Vision model name
    pub vision_model: String,
    /// Base URLs of the external APIs (overridable for local emulators)
    pub vision_base_url: String,
    pub identity_base_url: String,
    pub secure_token_base_url: String,
    pub storage_base_url: String,
    pub purchases_base_url: String,

    // --- Secrets ---
    /// Firebase Web API key (Identity Toolkit)
    pub firebase_api_key: String,
    /// Vision API key
    pub vision_api_key: String,
    /// RevenueCat public API key
    pub purchases_api_key: String,
    /// Shared secret RevenueCat sends in the webhook Authorization header
    pub purchases_webhook_secret: String,
}

impl Config {
    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            firebase_project_id: "test-project".to_string(),
            storage_bucket: "test-project.appspot.com".to_string(),
            frontend_url: "http://localhost:8081".to_string(),
            port: 8080,
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vision_base_url: "http://127.0.0.1:9".to_string(),
            identity_base_url: "http://127.0.0.1:9".to_string(),
            secure_token_base_url: "http://127.0.0.1:9".to_string(),
            storage_base_url: "http://127.0.0.1:9".to_string(),
            purchases_base_url: "http://127.0.0.1:9".to_string(),
            firebase_api_key: "test_api_key".to_string(),
            vision_api_key: "test_vision_key".to_string(),
            purchases_api_key: "test_purchases_key".to_string(),
            purchases_webhook_secret: "test_webhook_secret".to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file is read first if present (local development).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let firebase_project_id = required("FIREBASE_PROJECT_ID")?;
        let storage_bucket = env::var("STORAGE_BUCKET")
            .unwrap_or_else(|_| format!("{}.appspot.com", firebase_project_id));

        Ok(Self {
            firebase_project_id,
            storage_bucket,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:8081".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            vision_model: optional("VISION_MODEL", DEFAULT_VISION_MODEL),
            vision_base_url: optional("VISION_BASE_URL", DEFAULT_VISION_BASE_URL),
            identity_base_url: optional("IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
            secure_token_base_url: optional("SECURE_TOKEN_BASE_URL", DEFAULT_SECURE_TOKEN_BASE_URL),
            storage_base_url: optional("STORAGE_BASE_URL", DEFAULT_STORAGE_BASE_URL),
            purchases_base_url: optional("PURCHASES_BASE_URL", DEFAULT_PURCHASES_BASE_URL),

            firebase_api_key: required("FIREBASE_API_KEY")?,
            vision_api_key: required("OPENAI_API_KEY")?,
            purchases_api_key: required("REVENUECAT_API_KEY")?,
            purchases_webhook_secret: required("REVENUECAT_WEBHOOK_SECRET")?,
        })
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| default.to_string())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
