// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Authentication REST client.
//!
//! Handles:
//! - Email/password sign-up and sign-in
//! - Apple and Google sign-in with a provider ID token
//! - Session refresh via the Secure Token API
//! - Email and password changes
//! - Account deletion

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
/// Identity Toolkit requires a redirect URI even when posting a token directly.
const IDP_REQUEST_URI: &str = "http://localhost";

/// Federated identity providers accepted for sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityProvider {
    Apple,
    Google,
}

impl IdentityProvider {
    /// Parse the client-facing name (`apple`, `google`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "apple" => Some(Self::Apple),
            "google" => Some(Self::Google),
            _ => None,
        }
    }

    /// Firebase provider ID.
    pub fn provider_id(self) -> &'static str {
        match self {
            Self::Apple => "apple.com",
            Self::Google => "google.com",
        }
    }
}

/// A signed-in session as returned to the client.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds until the ID token expires
    pub expires_in: u64,
}

/// Identity Toolkit client.
#[derive(Clone)]
pub struct IdentityService {
    http: reqwest::Client,
    identity_base_url: String,
    secure_token_base_url: String,
    api_key: String,
}

impl IdentityService {
    pub fn new(
        identity_base_url: String,
        secure_token_base_url: String,
        api_key: String,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("failed building identity client: {e}"))
            })?;

        Ok(Self {
            http,
            identity_base_url,
            secure_token_base_url,
            api_key,
        })
    }

    /// Create an email/password account.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post_accounts("signUp", &body).await?;
        tracing::info!(user_id = %response.local_id, "Account created");
        response.into_session()
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post_accounts("signInWithPassword", &body).await?;
        response.into_session()
    }

    /// Sign in (creating the account on first use) with an ID token issued by
    /// Apple or Google. Apple tokens minted with a nonce need the raw nonce.
    pub async fn sign_in_with_idp(
        &self,
        provider: IdentityProvider,
        provider_token: &str,
        nonce: Option<&str>,
    ) -> Result<Session, AppError> {
        let body = serde_json::json!({
            "postBody": idp_post_body(provider, provider_token, nonce),
            "requestUri": IDP_REQUEST_URI,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });
        let response: AccountResponse = self.post_accounts("signInWithIdp", &body).await?;
        tracing::info!(
            user_id = %response.local_id,
            provider = provider.provider_id(),
            new_user = response.is_new_user,
            "Signed in with identity provider"
        );
        response.into_session()
    }

    /// Exchange a refresh token for a new ID token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AppError> {
        let url = format!(
            "{}/token?key={}",
            self.secure_token_base_url,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(format!("Token refresh request failed: {}", e)))?;

        let refreshed: RefreshResponse = check_response_json(response).await?;
        Ok(Session {
            user_id: refreshed.user_id,
            email: None,
            expires_in: parse_expires_in(&refreshed.expires_in),
            id_token: refreshed.id_token,
            refresh_token: refreshed.refresh_token,
        })
    }

    /// Change the signed-in user's email. Returns the replacement session.
    pub async fn update_email(&self, id_token: &str, new_email: &str) -> Result<Session, AppError> {
        let body = serde_json::json!({
            "idToken": id_token,
            "email": new_email,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post_accounts("update", &body).await?;
        tracing::info!(user_id = %response.local_id, "Email updated");
        response.into_session()
    }

    /// Change the signed-in user's password. Returns the replacement session.
    pub async fn update_password(
        &self,
        id_token: &str,
        new_password: &str,
    ) -> Result<Session, AppError> {
        let body = serde_json::json!({
            "idToken": id_token,
            "password": new_password,
            "returnSecureToken": true,
        });
        let response: AccountResponse = self.post_accounts("update", &body).await?;
        tracing::info!(user_id = %response.local_id, "Password updated");
        response.into_session()
    }

    /// Delete the signed-in user's auth account.
    pub async fn delete_account(&self, id_token: &str) -> Result<(), AppError> {
        let body = serde_json::json!({ "idToken": id_token });
        let _: serde_json::Value = self.post_accounts("delete", &body).await?;
        Ok(())
    }

    async fn post_accounts<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        body: &serde_json::Value,
    ) -> Result<T, AppError> {
        let url = format!(
            "{}/accounts:{}?key={}",
            self.identity_base_url,
            action,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response status, mapping provider error codes, and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if let Some(err) = provider_error(&body) {
            return Err(err);
        }

        return Err(AppError::AuthProvider(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::AuthProvider(format!("JSON parse error: {}", e)))
}

/// Map a Firebase `{"error":{"message":CODE}}` body to a client-facing error.
///
/// Credential and input problems are the caller's fault and map to 4xx.
fn provider_error(body: &str) -> Option<AppError> {
    let parsed: ProviderErrorBody = serde_json::from_str(body).ok()?;
    let message = parsed.error.message;
    // Codes may carry a suffix: "WEAK_PASSWORD : Password should be at least 6 characters"
    let code = message.split(':').next().unwrap_or_default().trim();

    let err = match code {
        "EMAIL_EXISTS" => AppError::BadRequest("Email is already registered".to_string()),
        "INVALID_EMAIL" => AppError::BadRequest("Email address is invalid".to_string()),
        "WEAK_PASSWORD" => {
            AppError::BadRequest("Password should be at least 6 characters".to_string())
        }
        "MISSING_PASSWORD" => AppError::BadRequest("Password is required".to_string()),
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            AppError::Unauthorized
        }
        "USER_DISABLED" => AppError::Forbidden("Account is disabled".to_string()),
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN"
        | "INVALID_REFRESH_TOKEN" | "USER_NOT_FOUND" => AppError::InvalidToken,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            tracing::warn!("Auth provider rate limit hit");
            AppError::AuthProvider("Too many attempts, try again later".to_string())
        }
        _ => AppError::AuthProvider(message),
    };
    Some(err)
}

/// Form-encoded credential for `accounts:signInWithIdp`.
fn idp_post_body(
    provider: IdentityProvider,
    provider_token: &str,
    nonce: Option<&str>,
) -> String {
    let mut body = format!(
        "id_token={}&providerId={}",
        urlencoding::encode(provider_token),
        provider.provider_id()
    );
    if let Some(nonce) = nonce {
        body.push_str("&nonce=");
        body.push_str(&urlencoding::encode(nonce));
    }
    body
}

fn parse_expires_in(raw: &str) -> u64 {
    raw.parse().unwrap_or(3600)
}

// ─── Wire Types ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
    /// Set by `signInWithIdp` when the account was just created
    #[serde(default)]
    is_new_user: bool,
}

impl AccountResponse {
    fn into_session(self) -> Result<Session, AppError> {
        let (Some(id_token), Some(refresh_token)) = (self.id_token, self.refresh_token) else {
            return Err(AppError::AuthProvider(
                "Response did not include a session".to_string(),
            ));
        };

        Ok(Session {
            user_id: self.local_id,
            email: self.email,
            id_token,
            refresh_token,
            expires_in: self.expires_in.as_deref().map_or(3600, parse_expires_in),
        })
    }
}

/// Secure Token API uses snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(message: &str) -> String {
        serde_json::json!({"error": {"code": 400, "message": message}}).to_string()
    }

    #[test]
    fn test_provider_error_mapping() {
        assert!(matches!(
            provider_error(&error_body("EMAIL_EXISTS")),
            Some(AppError::BadRequest(_))
        ));
        assert!(matches!(
            provider_error(&error_body("INVALID_LOGIN_CREDENTIALS")),
            Some(AppError::Unauthorized)
        ));
        assert!(matches!(
            provider_error(&error_body(
                "WEAK_PASSWORD : Password should be at least 6 characters"
            )),
            Some(AppError::BadRequest(_))
        ));
        assert!(matches!(
            provider_error(&error_body("TOKEN_EXPIRED")),
            Some(AppError::InvalidToken)
        ));
        assert!(matches!(
            provider_error(&error_body("SOMETHING_NEW")),
            Some(AppError::AuthProvider(m)) if m == "SOMETHING_NEW"
        ));
        assert!(provider_error("<html>bad gateway</html>").is_none());
    }

    #[test]
    fn test_account_response_into_session() {
        let response: AccountResponse = serde_json::from_str(
            r#"{
                "kind": "identitytoolkit#SignupNewUserResponse",
                "localId": "uid-123",
                "email": "driver@example.com",
                "idToken": "id.token.value",
                "refreshToken": "refresh-value",
                "expiresIn": "3600"
            }"#,
        )
        .unwrap();

        let session = response.into_session().unwrap();
        assert_eq!(session.user_id, "uid-123");
        assert_eq!(session.email.as_deref(), Some("driver@example.com"));
        assert_eq!(session.expires_in, 3600);
    }

    #[test]
    fn test_identity_provider_names() {
        assert_eq!(
            IdentityProvider::from_name("Apple"),
            Some(IdentityProvider::Apple)
        );
        assert_eq!(
            IdentityProvider::from_name(" google "),
            Some(IdentityProvider::Google)
        );
        assert_eq!(IdentityProvider::from_name("facebook"), None);
    }

    #[test]
    fn test_idp_post_body() {
        assert_eq!(
            idp_post_body(IdentityProvider::Google, "a.b.c", None),
            "id_token=a.b.c&providerId=google.com"
        );
        assert_eq!(
            idp_post_body(IdentityProvider::Apple, "tok", Some("n+1/2")),
            "id_token=tok&providerId=apple.com&nonce=n%2B1%2F2"
        );
    }

    #[test]
    fn test_idp_response_into_session() {
        let response: AccountResponse = serde_json::from_str(
            r#"{
                "federatedId": "https://accounts.google.com/1234",
                "providerId": "google.com",
                "localId": "uid-456",
                "email": "driver@gmail.com",
                "idToken": "id.token.value",
                "refreshToken": "refresh-value",
                "expiresIn": "3600",
                "isNewUser": true
            }"#,
        )
        .unwrap();
        assert!(response.is_new_user);

        let session = response.into_session().unwrap();
        assert_eq!(session.user_id, "uid-456");
    }

    #[test]
    fn test_account_response_without_tokens() {
        let response: AccountResponse =
            serde_json::from_str(r#"{"localId": "uid-123"}"#).unwrap();
        assert!(matches!(
            response.into_session(),
            Err(AppError::AuthProvider(_))
        ));
    }
}
