//! secrets::keychain_store
//!
//! OS-keychain token storage with one-way migration from the file backend.
//!
//! # Keys
//!
//! Records are JSON under composite keys `<bucket_id>:<account>`, where the
//! bucket id is derived from the app id, the normalized base URL, and the
//! config file path (see [`crate::secrets::bucket_id`]). A legacy bucket
//! derived from the config path alone stays readable so older installs
//! migrate cleanly, but is never written.
//!
//! # Migration
//!
//! On a keychain miss, `load` migrates in order:
//!
//! 1. a legacy-bucket entry is re-keyed under the current bucket and the
//!    legacy entry deleted;
//! 2. a record embedded in the config file is copied into the keychain and
//!    the file fields cleared.
//!
//! Either path runs exactly once; subsequent loads hit the keychain
//! directly.
//!
//! # Platform Support
//!
//! Uses the `keyring` crate (macOS Keychain, Windows Credential Manager,
//! Linux Secret Service) behind the `keychain` cargo feature. Platform
//! failures are translated into a "set `keyring_backend = \"file\"`"
//! remediation rather than surfaced raw.

use crate::auth::token_record::TokenRecord;
use crate::core::config::Config;

use super::file_store::FileTokenStore;
use super::traits::{SecretError, SecretVault, TokenStore};

/// Keychain-backed token storage.
pub struct KeychainTokenStore {
    /// Current bucket id scoping all keys.
    bucket: String,
    /// Legacy (config-path-only) bucket id, read for migration only.
    legacy_bucket: String,
    /// Raw secret storage.
    vault: Box<dyn SecretVault>,
}

impl KeychainTokenStore {
    /// Create a keychain store for the given config handle.
    #[cfg(feature = "keychain")]
    pub fn new(cfg: &Config) -> Result<Self, SecretError> {
        Ok(Self::with_vault(
            cfg,
            Box::new(keyring_vault::KeyringVault::new()),
        ))
    }

    /// Create a keychain store over an arbitrary vault.
    ///
    /// Used by tests to exercise migration without an OS keychain.
    pub fn with_vault(cfg: &Config, vault: Box<dyn SecretVault>) -> Self {
        Self {
            bucket: super::bucket_id(&cfg.doc.app_id, &cfg.doc.base_url, cfg.path()),
            legacy_bucket: super::legacy_bucket_id(cfg.path()),
            vault,
        }
    }

    fn key(&self, account: &str) -> String {
        format!("{}:{}", self.bucket, account)
    }

    fn legacy_key(&self, account: &str) -> String {
        format!("{}:{}", self.legacy_bucket, account)
    }

    /// Migrate a legacy-bucket entry to the current bucket, if present.
    fn migrate_legacy(&self, account: &str) -> Result<Option<TokenRecord>, SecretError> {
        let legacy_key = self.legacy_key(account);
        let Some(json) = self.vault.get(&legacy_key)? else {
            return Ok(None);
        };

        let record =
            TokenRecord::parse(&json).map_err(|e| SecretError::ReadError(e.to_string()))?;
        self.vault.set(&self.key(account), &json)?;
        self.vault.delete(&legacy_key)?;
        Ok(Some(record))
    }

    /// Migrate a config-embedded record into the keychain, if present.
    fn migrate_file(
        &self,
        cfg: &mut Config,
        account: &str,
    ) -> Result<Option<TokenRecord>, SecretError> {
        let Some(record) = FileTokenStore::peek(cfg, account) else {
            return Ok(None);
        };

        let json = record
            .to_json()
            .map_err(|e| SecretError::WriteError(e.to_string()))?;
        self.vault.set(&self.key(account), &json)?;
        FileTokenStore::clear_embedded(cfg, account)?;
        Ok(Some(record))
    }
}

impl TokenStore for KeychainTokenStore {
    fn load(&self, cfg: &mut Config, account: &str) -> Result<Option<TokenRecord>, SecretError> {
        if let Some(json) = self.vault.get(&self.key(account))? {
            let record =
                TokenRecord::parse(&json).map_err(|e| SecretError::ReadError(e.to_string()))?;
            return Ok(Some(record));
        }

        if let Some(record) = self.migrate_legacy(account)? {
            return Ok(Some(record));
        }

        self.migrate_file(cfg, account)
    }

    fn save(
        &self,
        _cfg: &mut Config,
        account: &str,
        record: &TokenRecord,
    ) -> Result<(), SecretError> {
        let json = record
            .to_json()
            .map_err(|e| SecretError::WriteError(e.to_string()))?;
        self.vault.set(&self.key(account), &json)
    }

    fn clear(&self, cfg: &mut Config, account: &str) -> Result<(), SecretError> {
        self.vault.delete(&self.key(account))?;
        self.vault.delete(&self.legacy_key(account))?;
        // Un-migrated file fields must not survive a clear either.
        FileTokenStore::clear_embedded(cfg, account)
    }
}

#[cfg(feature = "keychain")]
mod keyring_vault {
    //! Real vault over the `keyring` crate.

    use keyring::Entry;

    use crate::secrets::traits::{SecretError, SecretVault};

    /// Keychain service name for all Stratus entries.
    const SERVICE: &str = "stratus-cli";

    pub struct KeyringVault;

    impl KeyringVault {
        pub fn new() -> Self {
            Self
        }

        fn entry(key: &str) -> Result<Entry, SecretError> {
            Entry::new(SERVICE, key)
                .map_err(|e| SecretError::ReadError(format!("cannot create keyring entry: {}", e)))
        }

        fn translate(err: keyring::Error, fallback: fn(String) -> SecretError) -> SecretError {
            match err {
                keyring::Error::PlatformFailure(e) => SecretError::KeychainUnavailable(e.to_string()),
                keyring::Error::NoStorageAccess(e) => SecretError::KeychainUnavailable(e.to_string()),
                e => fallback(e.to_string()),
            }
        }
    }

    impl SecretVault for KeyringVault {
        fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
            match Self::entry(key)?.get_password() {
                Ok(value) => Ok(Some(value)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(Self::translate(e, SecretError::ReadError)),
            }
        }

        fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
            Self::entry(key)?
                .set_password(value)
                .map_err(|e| Self::translate(e, SecretError::WriteError))
        }

        fn delete(&self, key: &str) -> Result<(), SecretError> {
            match Self::entry(key)?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(Self::translate(e, SecretError::DeleteError)),
            }
        }
    }
}
