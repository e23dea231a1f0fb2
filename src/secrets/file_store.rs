//! secrets::file_store
//!
//! Config-embedded token storage.
//!
//! # Design
//!
//! The default backend. Token record fields live directly in the account's
//! configuration entry; every mutation persists the whole config file
//! atomically through [`Config::save`]. The config file carries 0600
//! permissions on Unix precisely because of this backend.

use crate::auth::token_record::TokenRecord;
use crate::core::config::Config;

use super::traits::{SecretError, TokenStore};

/// Token storage embedded in the configuration file.
#[derive(Debug, Default)]
pub struct FileTokenStore;

impl FileTokenStore {
    /// Create the file-backed store.
    pub fn new() -> Self {
        Self
    }

    /// Read the embedded record without the trait's `&mut` requirement.
    ///
    /// Shared with the keychain backend's migration path.
    pub(crate) fn peek(cfg: &Config, account: &str) -> Option<TokenRecord> {
        let record = cfg.doc.accounts.get(account)?.record();
        if record.is_empty() {
            None
        } else {
            Some(record)
        }
    }

    /// Clear the embedded fields and persist. Used by migration.
    pub(crate) fn clear_embedded(cfg: &mut Config, account: &str) -> Result<(), SecretError> {
        let Some(entry) = cfg.doc.accounts.get_mut(account) else {
            return Ok(());
        };
        entry.clear_tokens();
        cfg.save()
            .map_err(|e| SecretError::ConfigPersist(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self, cfg: &mut Config, account: &str) -> Result<Option<TokenRecord>, SecretError> {
        Ok(Self::peek(cfg, account))
    }

    fn save(
        &self,
        cfg: &mut Config,
        account: &str,
        record: &TokenRecord,
    ) -> Result<(), SecretError> {
        cfg.doc
            .accounts
            .entry(account.to_string())
            .or_default()
            .apply_record(record);
        cfg.save()
            .map_err(|e| SecretError::ConfigPersist(e.to_string()))
    }

    fn clear(&self, cfg: &mut Config, account: &str) -> Result<(), SecretError> {
        Self::clear_embedded(cfg, account)
    }
}
