//! auth::errors
//!
//! Authentication error types and the remediation strings they render.
//!
//! # Message contract
//!
//! The rendered message text is part of the CLI's integration surface:
//! callers and tests discriminate outcomes by substring ("revoked or
//! expired", the literal re-login command line). Treat every template here
//! as frozen; changing one is a breaking change even when the variant shape
//! stays the same.
//!
//! # Security
//!
//! Error messages never include token values.

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::secrets::SecretError;

/// The bare re-login command suggested when credentials are unusable.
pub const RELOGIN_COMMAND: &str = "stratus auth user login";

/// The full re-login command embedding a scope string and forced consent.
pub fn relogin_command_with_scopes(scopes: &str) -> String {
    format!("{RELOGIN_COMMAND} --scopes \"{scopes}\" --force-consent")
}

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No usable credential is stored for the account.
    #[error("account '{0}' has no stored user credential. Run `stratus auth user login` to sign in.")]
    NotLoggedIn(String),

    /// The stored record has no refresh token; offline access was never granted.
    #[error("no refresh token stored for account '{0}': offline access was never granted. Run `stratus auth user login` to sign in again.")]
    RefreshTokenMissing(String),

    /// The provider rejected the refresh token. Stored credentials are
    /// cleared before this error is returned.
    #[error("refresh token revoked or expired for account '{account}' ({cause}). Stored credentials were cleared. Run `stratus auth user login` to sign in again.")]
    RefreshRejected { account: String, cause: String },

    /// Preflight found granted scopes insufficient for a command.
    #[error("account '{}' is missing scopes: {}. Run `{}` to re-authorize.", .account, .missing.join(" "), relogin_command_with_scopes(.required))]
    MissingScopes {
        account: String,
        missing: Vec<String>,
        required: String,
    },

    /// The callback carried a state parameter that does not match ours.
    #[error("oauth state mismatch")]
    StateMismatch,

    /// The provider reported an error on the callback.
    #[error("authorization failed: {code}: {description}")]
    ProviderDenied { code: String, description: String },

    /// The callback carried neither a code nor an error.
    #[error("oauth callback missing code")]
    MissingCode,

    /// No callback arrived within the configured window.
    #[error("timed out waiting for oauth callback")]
    CallbackTimeout,

    /// The code/token exchange failed or returned a malformed body.
    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    /// Token response lacked an access token.
    #[error("token response missing access_token")]
    MissingAccessToken,

    /// Token response lacked a refresh token; offline access is a hard
    /// precondition of the login flow.
    #[error("token response missing refresh_token: offline access (offline_access) was not granted")]
    MissingRefreshToken,

    /// Error from token storage.
    #[error("token store error: {0}")]
    Store(#[from] SecretError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Network error talking to the token endpoints.
    #[error("network error: {0}")]
    Network(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        AuthError::ExchangeFailed(err.to_string())
    }
}
