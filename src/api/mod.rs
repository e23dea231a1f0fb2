//! api
//!
//! Thin bearer-authenticated client for the Open API.
//!
//! # Design
//!
//! The platform's business endpoints are opaque remote calls parameterized
//! by a bearer token the auth subsystem supplies. This client only speaks
//! the envelope: JSON requests, a `{code, msg, data}` response shape where
//! a non-zero `code` is an application error. Scope-insufficiency errors
//! surface here as [`ApiError::Api`]; the command layer runs them through
//! the scope policy engine for remediation.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// HTTP timeout for Open API calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from Open API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The platform rejected the call.
    #[error("api error {code}: {msg}")]
    Api { code: i64, msg: String },

    /// Transport-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not match the envelope.
    #[error("malformed api response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Response envelope all Open API endpoints share.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: serde_json::Value,
}

/// Bearer-authenticated Open API client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the given base URL.
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET an endpoint.
    pub async fn get(&self, path: &str, token: &str) -> Result<serde_json::Value, ApiError> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    /// POST a JSON body to an endpoint.
    pub async fn post(
        &self,
        path: &str,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, ApiError> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope(response: reqwest::Response) -> Result<serde_json::Value, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|_| ApiError::Malformed(format!("status {}: {}", status, text)))?;

        if envelope.code != 0 {
            return Err(ApiError::Api {
                code: envelope.code,
                msg: envelope.msg,
            });
        }
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_cleanly() {
        let client = ApiClient::new("https://open.stratus.dev/");
        assert_eq!(
            client.url("/open-apis/mail/v1/messages"),
            "https://open.stratus.dev/open-apis/mail/v1/messages"
        );
    }

    #[test]
    fn envelope_error_shape() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"code": 99991679, "msg": "access denied, requires [mail:mail]"}"#,
        )
        .unwrap();
        assert_eq!(envelope.code, 99991679);
        assert!(envelope.msg.contains("mail:mail"));
        assert!(envelope.data.is_null());
    }
}
