//! auth::flow
//!
//! Interactive OAuth2 authorization-code login with a local callback.
//!
//! # Sequence
//!
//! 1. Generate a random state nonce and build the authorize URL.
//! 2. Bind a listener on the fixed localhost callback port.
//! 3. Open the system browser (falling back to printing the URL).
//! 4. Wait for the redirect, a provider error, or the timeout.
//! 5. Exchange the authorization code for tokens; offline access (a
//!    refresh token in the response) is a hard precondition.
//!
//! # Concurrency
//!
//! The callback handler runs concurrently with the waiting flow. Exactly
//! one outcome is ever delivered: a single-fire guard
//! (`Mutex<Option<oneshot::Sender>>`, taken on first use) protects the
//! capacity-one result channel, so a provider retry or a reloaded browser
//! tab is answered politely and dropped. The accept loop keeps serving
//! until the waiting flow tears it down, which keeps teardown off the
//! response path.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::RngCore;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::errors::AuthError;
use super::oauth_client::{OAuthHttpClient, TokenResponse};
use super::registry::{consented_services, SERVICES};
use super::scopes::ScopeSet;
use super::token_record::{RefreshMeta, TokenRecord};

/// Fixed localhost port the redirect URI points at.
pub const CALLBACK_PORT: u16 = 8911;

/// Fixed callback path.
pub const CALLBACK_PATH: &str = "/callback";

/// Default wait for the user to complete authorization in the browser.
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Login flow parameters.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    /// Scopes to request; the bare sentinel set when the user passed none.
    pub scopes: ScopeSet,

    /// Force the consent screen even when previously granted.
    pub force_consent: bool,

    /// How long to wait for the callback.
    pub timeout: Duration,

    /// Callback port; fixed in production, ephemeral (0) in tests.
    pub port: u16,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self {
            scopes: ScopeSet::sentinel_only(),
            force_consent: false,
            timeout: DEFAULT_CALLBACK_TIMEOUT,
            port: CALLBACK_PORT,
        }
    }
}

/// A login flow with its listener bound and authorize URL built.
pub struct PendingLogin {
    /// The URL the browser must visit.
    pub authorize_url: String,

    redirect_uri: String,
    state: String,
    listener: TcpListener,
    timeout: Duration,
}

impl LoginFlow {
    /// Bind the callback listener and build the authorize URL.
    pub async fn start(&self, client: &OAuthHttpClient) -> Result<PendingLogin, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(|e| {
                AuthError::Network(format!(
                    "failed to bind callback listener on port {}: {}",
                    self.port, e
                ))
            })?;
        let port = listener
            .local_addr()
            .map(|a| a.port())
            .unwrap_or(self.port);

        let state = generate_state();
        let redirect_uri = redirect_uri(port);
        let authorize_url = build_authorize_url(
            &client.authorize_url_base(),
            client.app_id(),
            &redirect_uri,
            &state,
            &self.scopes,
            self.force_consent,
        )?;

        Ok(PendingLogin {
            authorize_url,
            redirect_uri,
            state,
            listener,
            timeout: self.timeout,
        })
    }
}

impl PendingLogin {
    /// Try to open the system browser at the authorize URL.
    ///
    /// A failure is degraded mode, not fatal: the caller prints the URL
    /// for manual navigation.
    pub fn open_browser(&self) -> bool {
        open::that(&self.authorize_url).is_ok()
    }

    /// Wait for the callback and exchange the code for tokens.
    pub async fn finish(self, client: &OAuthHttpClient) -> Result<TokenResponse, AuthError> {
        let code = wait_for_callback(self.listener, &self.state, self.timeout).await?;
        let response = client.exchange_code(&code, &self.redirect_uri).await?;

        if response.access_token.is_empty() {
            return Err(AuthError::MissingAccessToken);
        }
        if response.refresh_token.is_empty() {
            return Err(AuthError::MissingRefreshToken);
        }
        Ok(response)
    }
}

/// Generate the opaque state nonce: 16 random bytes, hex-encoded.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// The fixed localhost redirect URI for a callback port.
pub fn redirect_uri(port: u16) -> String {
    format!("http://localhost:{}{}", port, CALLBACK_PATH)
}

/// Build the authorize URL with properly encoded query parameters.
pub fn build_authorize_url(
    base: &str,
    app_id: &str,
    redirect_uri: &str,
    state: &str,
    scopes: &ScopeSet,
    force_consent: bool,
) -> Result<String, AuthError> {
    let mut params = vec![
        ("client_id", app_id.to_string()),
        ("response_type", "code".to_string()),
        ("redirect_uri", redirect_uri.to_string()),
        ("state", state.to_string()),
        ("scope", scopes.to_scope_string()),
    ];
    if force_consent {
        params.push(("force_consent", "true".to_string()));
    }

    let url = reqwest::Url::parse_with_params(base, &params)
        .map_err(|e| AuthError::Network(format!("invalid authorize URL: {}", e)))?;
    Ok(url.to_string())
}

/// Query parameters the provider may send to the callback.
#[derive(Debug, Default)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Parse the request line of the callback HTTP request.
fn parse_callback_request(request: &str) -> CallbackParams {
    let mut params = CallbackParams::default();

    let Some(first_line) = request.lines().next() else {
        return params;
    };
    let Some(path) = first_line.split_whitespace().nth(1) else {
        return params;
    };
    let Ok(url) = reqwest::Url::parse(&format!("http://localhost{}", path)) else {
        return params;
    };

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => params.code = Some(value.into_owned()),
            "state" => params.state = Some(value.into_owned()),
            "error" => params.error = Some(value.into_owned()),
            "error_description" => params.error_description = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

/// Classify a callback into its terminal outcome.
fn classify_callback(params: CallbackParams, expected_state: &str) -> Result<String, AuthError> {
    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    if let Some(error) = params.error {
        return Err(AuthError::ProviderDenied {
            code: error,
            description: params.error_description.unwrap_or_default(),
        });
    }
    match params.code {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(AuthError::MissingCode),
    }
}

/// Serve the callback listener until one outcome is delivered or the
/// timeout fires. Returns the authorization code on success.
pub async fn wait_for_callback(
    listener: TcpListener,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, AuthError> {
    let (tx, rx) = oneshot::channel::<Result<String, AuthError>>();
    let slot = Arc::new(Mutex::new(Some(tx)));
    let expected = expected_state.to_string();

    let server = tokio::spawn({
        let slot = Arc::clone(&slot);
        async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };

                let mut buffer = vec![0u8; 8192];
                let read = stream.read(&mut buffer).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buffer[..read]);
                let outcome = classify_callback(parse_callback_request(&request), &expected);

                let body = match &outcome {
                    Ok(_) => "<html><body><h1>Login successful</h1><p>You can close this window and return to the terminal.</p></body></html>",
                    Err(_) => "<html><body><h1>Login failed</h1><p>Return to the terminal for details.</p></body></html>",
                };
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;

                // Single-fire: only the first outcome reaches the waiting
                // flow; later callbacks are answered and dropped.
                if let Ok(mut guard) = slot.lock() {
                    if let Some(tx) = guard.take() {
                        let _ = tx.send(outcome);
                    }
                }
            }
        }
    });

    let result = match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_closed)) => Err(AuthError::CallbackTimeout),
        Err(_elapsed) => Err(AuthError::CallbackTimeout),
    };

    server.abort();
    result
}

/// Build the account token record from a successful exchange.
pub fn record_from_response(response: &TokenResponse, requested: &ScopeSet, now: i64) -> TokenRecord {
    let granted = if response.scope.is_empty() {
        requested.clone()
    } else {
        ScopeSet::parse(&response.scope)
    };
    let scopes = granted.to_scope_string();

    TokenRecord {
        access_token: response.access_token.clone(),
        refresh_token: response.refresh_token.clone(),
        expires_at: now + response.expires_in,
        scopes: scopes.clone(),
        refresh_meta: Some(RefreshMeta {
            refresh_token: response.refresh_token.clone(),
            services: consented_services(SERVICES, &granted),
            scopes,
            created_at: now,
        }),
    }
}

/// Current epoch seconds; shared by the login command and tests.
pub fn epoch_now() -> i64 {
    Utc::now().timestamp()
}
