//! auth::accounts
//!
//! Named-account CRUD and current-account resolution.
//!
//! # Design
//!
//! All account mutation flows through this module's get/save pairs over the
//! threaded [`Config`] handle; no other component writes account fields
//! directly. Secret-store entries are purged together with the account so a
//! deleted account never leaves credentials behind.
//!
//! # Current account
//!
//! Resolution precedence: explicit override (`--account`) >
//! `$STRATUS_ACCOUNT` > configured `default_account` > the literal
//! `"default"`.

use crate::core::config::{AccountEntry, Config, DEFAULT_ACCOUNT};
use crate::secrets::{SecretError, TokenStore};

/// Environment variable selecting the account for one invocation.
pub const ACCOUNT_ENV: &str = "STRATUS_ACCOUNT";

/// Account operations over the threaded config handle.
pub struct AccountManager<'a> {
    cfg: &'a mut Config,
}

impl<'a> AccountManager<'a> {
    /// Wrap a config handle.
    pub fn new(cfg: &'a mut Config) -> Self {
        Self { cfg }
    }

    /// The underlying config handle.
    pub fn config(&mut self) -> &mut Config {
        self.cfg
    }

    /// All known account names: stored accounts plus the configured
    /// default, deduplicated and sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cfg.doc.accounts.keys().cloned().collect();
        let default = &self.cfg.doc.default_account;
        if !default.is_empty() && !names.iter().any(|n| n == default) {
            names.push(default.clone());
        }
        names.sort();
        names
    }

    /// Resolve the current account name.
    ///
    /// `explicit` is the `--account` flag; the environment and the
    /// configured default fill in behind it.
    pub fn current(&self, explicit: Option<&str>) -> String {
        resolve_current(
            explicit,
            std::env::var(ACCOUNT_ENV).ok().as_deref(),
            &self.cfg.doc.default_account,
        )
    }

    /// Get an account entry, if stored.
    pub fn get(&self, name: &str) -> Option<&AccountEntry> {
        self.cfg.doc.accounts.get(name)
    }

    /// Get or create an account entry.
    pub fn ensure(&mut self, name: &str) -> &mut AccountEntry {
        self.cfg.doc.accounts.entry(name.to_string()).or_default()
    }

    /// Overwrite an account entry and persist.
    pub fn save(&mut self, name: &str, entry: AccountEntry) -> Result<(), SecretError> {
        self.cfg.doc.accounts.insert(name.to_string(), entry);
        self.cfg
            .save()
            .map_err(|e| SecretError::ConfigPersist(e.to_string()))
    }

    /// Make an account the configured default and persist.
    pub fn set_default(&mut self, name: &str) -> Result<(), SecretError> {
        self.ensure(name);
        self.cfg.doc.default_account = name.to_string();
        self.cfg
            .save()
            .map_err(|e| SecretError::ConfigPersist(e.to_string()))
    }

    /// Delete an account and purge its secret-store entries.
    ///
    /// Deleting the configured default resets the default to the literal
    /// `"default"` so the config never points at a missing account.
    pub fn delete(&mut self, name: &str, store: &dyn TokenStore) -> Result<(), SecretError> {
        store.clear(self.cfg, name)?;
        self.cfg.doc.accounts.remove(name);
        if self.cfg.doc.default_account == name {
            self.cfg.doc.default_account = DEFAULT_ACCOUNT.to_string();
        }
        self.cfg
            .save()
            .map_err(|e| SecretError::ConfigPersist(e.to_string()))
    }

    /// Clear an account's tokens without deleting the account shell.
    pub fn clear_tokens(&mut self, name: &str, store: &dyn TokenStore) -> Result<(), SecretError> {
        store.clear(self.cfg, name)
    }
}

/// Pure resolution of the current account name.
fn resolve_current(explicit: Option<&str>, env: Option<&str>, configured: &str) -> String {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if let Some(name) = env.filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    if !configured.is_empty() {
        return configured.to_string();
    }
    DEFAULT_ACCOUNT.to_string()
}
