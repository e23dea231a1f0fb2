//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Layout
//!
//! ```toml
//! app_id = "cli_a1b2c3"
//! app_secret = "..."
//! base_url = "https://open.stratus.dev"
//! default_account = "default"
//! default_scopes = ["offline_access"]
//! keyring_backend = "file"
//!
//! [accounts.work]
//! user_access_token = "..."
//! refresh_token = "..."
//! token_expires_at = 1765432100
//! scopes = "offline_access mail:mail"
//!
//! [accounts.work.refresh_meta]
//! refresh_token = "..."
//! services = ["mail"]
//! scopes = "offline_access mail:mail"
//! created_at = 1765428500
//! ```
//!
//! Token fields are only populated when `keyring_backend = "file"`; the
//! keychain backend clears them on migration and stores the record in the
//! OS secret store instead.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::auth::token_record::{RefreshMeta, TokenRecord};

/// The account name used when nothing else is configured or selected.
pub const DEFAULT_ACCOUNT: &str = "default";

/// The default Open Platform base URL.
pub const DEFAULT_BASE_URL: &str = "https://open.stratus.dev";

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfigDoc {
    /// Application (client) id issued by the platform developer console.
    pub app_id: String,

    /// Application secret paired with `app_id`.
    pub app_secret: String,

    /// Open API base URL.
    pub base_url: String,

    /// Name of the default account.
    pub default_account: String,

    /// Scopes requested by `auth user login` when none are given.
    pub default_scopes: Vec<String>,

    /// Token storage backend: "file" or "keychain".
    pub keyring_backend: String,

    /// Named accounts.
    pub accounts: BTreeMap<String, AccountEntry>,
}

impl Default for ConfigDoc {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_account: DEFAULT_ACCOUNT.to_string(),
            default_scopes: Vec::new(),
            keyring_backend: "file".to_string(),
            accounts: BTreeMap::new(),
        }
    }
}

/// Per-account configuration block.
///
/// The token fields mirror [`TokenRecord`]; conversion goes through
/// [`AccountEntry::record`] and [`AccountEntry::apply_record`] so the file
/// token store never touches fields directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccountEntry {
    /// User access token (secret; empty when stored in the keychain).
    pub user_access_token: String,

    /// Refresh token (secret; empty when stored in the keychain).
    pub refresh_token: String,

    /// Absolute access-token expiry, epoch seconds. Zero when unset.
    pub token_expires_at: i64,

    /// Space-delimited granted-scope string recorded at grant time.
    pub scopes: String,

    /// Refresh-token metadata recorded at grant/refresh time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_meta: Option<RefreshMeta>,
}

impl AccountEntry {
    /// Extract the token record embedded in this entry.
    pub fn record(&self) -> TokenRecord {
        TokenRecord {
            access_token: self.user_access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.token_expires_at,
            scopes: self.scopes.clone(),
            refresh_meta: self.refresh_meta.clone(),
        }
    }

    /// Overwrite the embedded token record.
    pub fn apply_record(&mut self, record: &TokenRecord) {
        self.user_access_token = record.access_token.clone();
        self.refresh_token = record.refresh_token.clone();
        self.token_expires_at = record.expires_at;
        self.scopes = record.scopes.clone();
        self.refresh_meta = record.refresh_meta.clone();
    }

    /// Clear all embedded token fields, keeping the account shell.
    pub fn clear_tokens(&mut self) {
        self.user_access_token.clear();
        self.refresh_token.clear();
        self.token_expires_at = 0;
        self.scopes.clear();
        self.refresh_meta = None;
    }
}
