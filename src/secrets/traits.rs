//! secrets::traits
//!
//! Token storage trait definitions.
//!
//! # Design
//!
//! Two layers:
//!
//! - [`TokenStore`] is the per-account contract the rest of the crate uses:
//!   load/save/clear a [`TokenRecord`] for a named account, threading the
//!   configuration handle through every call (the file backend stores the
//!   record in it; the keychain backend mutates it during migration).
//! - [`SecretVault`] is a raw key-value interface over the OS secret store,
//!   kept separate so the keychain backend's migration logic is testable
//!   against an in-memory vault.
//!
//! # Security
//!
//! Implementations must never log, print, or include secret values in
//! error messages.

use thiserror::Error;

use crate::auth::token_record::TokenRecord;
use crate::core::config::Config;

/// Errors from token storage operations.
///
/// Note: error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from storage.
    #[error("failed to read token record: {0}")]
    ReadError(String),

    /// Failed to write to storage.
    #[error("failed to write token record: {0}")]
    WriteError(String),

    /// Failed to delete from storage.
    #[error("failed to delete token record: {0}")]
    DeleteError(String),

    /// The configured backend name is not recognized.
    #[error("unsupported keyring backend '{0}' (valid: file, keychain)")]
    UnsupportedBackend(String),

    /// Backend exists but is not available in this build.
    #[error("token storage backend not available: {0}")]
    ProviderNotAvailable(String),

    /// The OS keychain cannot be used on this platform. The remediation is
    /// to switch the backend, not to retry.
    #[error("OS keychain unavailable: {0}. Set `keyring_backend = \"file\"` in the config file to store tokens there instead.")]
    KeychainUnavailable(String),

    /// Persisting the configuration file failed mid-operation.
    #[error("failed to persist config: {0}")]
    ConfigPersist(String),
}

/// Per-account token storage.
///
/// All methods take the threaded configuration handle; implementations must
/// treat each read-modify-write as load-then-save with no partial writes.
pub trait TokenStore {
    /// Load the record for an account.
    ///
    /// Returns `Ok(None)` when no record is stored (for the file backend,
    /// when every embedded field is empty/zero).
    fn load(&self, cfg: &mut Config, account: &str) -> Result<Option<TokenRecord>, SecretError>;

    /// Save the record for an account, overwriting any previous one.
    fn save(
        &self,
        cfg: &mut Config,
        account: &str,
        record: &TokenRecord,
    ) -> Result<(), SecretError>;

    /// Delete the record for an account. Idempotent.
    fn clear(&self, cfg: &mut Config, account: &str) -> Result<(), SecretError>;
}

/// Raw key-value secret storage (OS keychain or an in-memory test vault).
pub trait SecretVault: Send + Sync {
    /// Get a secret by key. `Ok(None)` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, SecretError>;

    /// Set a secret, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), SecretError>;

    /// Delete a secret. Idempotent.
    fn delete(&self, key: &str) -> Result<(), SecretError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = SecretError::UnsupportedBackend("vault".into());
        assert!(err.to_string().contains("vault"));
        assert!(err.to_string().contains("valid: file, keychain"));

        let err = SecretError::KeychainUnavailable("no dbus".into());
        assert!(err.to_string().contains("keyring_backend = \"file\""));

        let err = SecretError::ReadError("disk full".into());
        assert!(err.to_string().contains("read"));
    }
}
