//! auth::oauth_client
//!
//! HTTP client for the platform's OAuth2 token endpoints.
//!
//! # Endpoints
//!
//! - `GET  <base>/oauth/authorize` - URL construction only; the browser
//!   navigates there, this client never calls it
//! - `POST <base>/oauth/token` - JSON body, used for both the
//!   authorization-code exchange and refresh
//!
//! # Token Refresh
//!
//! Refresh tokens are single-use and rotate on each refresh. Callers must
//! persist the new refresh token from each response.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;

use super::errors::AuthError;

/// Authorize endpoint path (browser navigation only).
pub const AUTHORIZE_PATH: &str = "/oauth/authorize";

/// Token endpoint path (code exchange and refresh).
pub const TOKEN_PATH: &str = "/oauth/token";

/// HTTP timeout for token endpoint calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Token response from the platform.
///
/// Both success and error bodies deserialize into this shape; an empty
/// `error` field marks success.
#[derive(Clone, Default, Deserialize)]
pub struct TokenResponse {
    /// The user access token.
    #[serde(default)]
    pub access_token: String,

    /// The rotated refresh token.
    #[serde(default)]
    pub refresh_token: String,

    /// Seconds until the access token expires.
    #[serde(default)]
    pub expires_in: i64,

    /// Token type (always "Bearer").
    #[serde(default)]
    pub token_type: String,

    /// Granted scopes, space-delimited.
    #[serde(default)]
    pub scope: String,

    /// Provider error code, empty on success.
    #[serde(default)]
    pub error: String,

    /// Human-readable error description.
    #[serde(default)]
    pub error_description: String,
}

// Custom Debug to redact token values
impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("error", &self.error)
            .finish()
    }
}

/// Seam for the token-refresh call, so the lifecycle manager is testable
/// without a network.
#[async_trait]
pub trait RefreshClient: Send + Sync {
    /// Exchange a refresh token for a fresh token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;
}

/// Real client for the platform token endpoints.
#[derive(Clone)]
pub struct OAuthHttpClient {
    http: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
}

impl OAuthHttpClient {
    /// Create a client for the given base URL and app credentials.
    pub fn new(base_url: &str, app_id: &str, app_secret: &str) -> Self {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
        }
    }

    /// The app (client) id this client authenticates as.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The token endpoint URL.
    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url, TOKEN_PATH)
    }

    /// The authorize endpoint URL (no call is made; the browser goes here).
    pub fn authorize_url_base(&self) -> String {
        format!("{}{}", self.base_url, AUTHORIZE_PATH)
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, AuthError> {
        self.post_token(json!({
            "grant_type": "authorization_code",
            "client_id": self.app_id,
            "client_secret": self.app_secret,
            "code": code,
            "redirect_uri": redirect_uri,
        }))
        .await
    }

    async fn post_token(&self, body: serde_json::Value) -> Result<TokenResponse, AuthError> {
        let response = self.http.post(self.token_url()).json(&body).send().await?;

        let status = response.status();
        let text = response.text().await?;

        let parsed: TokenResponse = serde_json::from_str(&text).map_err(|_| {
            AuthError::ExchangeFailed(format!("unexpected response ({}): {}", status, text))
        })?;

        if !parsed.error.is_empty() {
            return Err(AuthError::ExchangeFailed(format!(
                "{}: {}",
                parsed.error, parsed.error_description
            )));
        }
        if !status.is_success() {
            return Err(AuthError::ExchangeFailed(format!(
                "token endpoint returned {}",
                status
            )));
        }

        Ok(parsed)
    }
}

#[async_trait]
impl RefreshClient for OAuthHttpClient {
    async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.post_token(json!({
            "grant_type": "refresh_token",
            "client_id": self.app_id,
            "client_secret": self.app_secret,
            "refresh_token": refresh_token,
        }))
        .await
    }
}

// Custom Debug to avoid exposing the app secret
impl fmt::Debug for OAuthHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthHttpClient")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_url_format() {
        let client = OAuthHttpClient::new("https://open.stratus.dev/", "cli_a", "s");
        assert_eq!(client.token_url(), "https://open.stratus.dev/oauth/token");
        assert_eq!(
            client.authorize_url_base(),
            "https://open.stratus.dev/oauth/authorize"
        );
    }

    #[test]
    fn token_response_deserialize_success() {
        let json = r#"{
            "access_token": "u-abc",
            "refresh_token": "r-def",
            "expires_in": 7200,
            "token_type": "Bearer",
            "scope": "offline_access mail:mail"
        }"#;

        let response: TokenResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(response.access_token, "u-abc");
        assert_eq!(response.refresh_token, "r-def");
        assert_eq!(response.expires_in, 7200);
        assert!(response.error.is_empty());
    }

    #[test]
    fn token_response_deserialize_error() {
        let json = r#"{
            "error": "invalid_grant",
            "error_description": "refresh token is revoked"
        }"#;

        let response: TokenResponse = serde_json::from_str(json).expect("parse");
        assert!(response.access_token.is_empty());
        assert_eq!(response.error, "invalid_grant");
        assert_eq!(response.error_description, "refresh token is revoked");
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let response = TokenResponse {
            access_token: "u-secret".into(),
            refresh_token: "r-secret".into(),
            ..Default::default()
        };
        let debug_output = format!("{:?}", response);
        assert!(!debug_output.contains("u-secret"));
        assert!(!debug_output.contains("r-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
