//! secrets
//!
//! Token storage backends and bucket identity.
//!
//! # Backends
//!
//! - [`FileTokenStore`]: record fields embedded in the config file (default)
//! - [`KeychainTokenStore`]: OS keychain via the `keyring` crate
//!   (feature-gated), with one-way migration from the file backend
//!
//! # Bucket identity
//!
//! Keychain entries are namespaced by a bucket id derived from the app id,
//! the normalized base URL, and the config file path, so tokens never leak
//! across distinct app/endpoint/profile combinations.
//!
//! # Backend Selection
//!
//! ```ignore
//! use stratus_cli::secrets::create_store;
//!
//! let store = create_store(&config)?; // honors config.doc.keyring_backend
//! ```

mod file_store;
mod keychain_store;
mod traits;

pub use file_store::FileTokenStore;
pub use keychain_store::KeychainTokenStore;
pub use traits::{SecretError, SecretVault, TokenStore};

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::core::config::Config;

/// The default token storage backend name.
pub const DEFAULT_BACKEND: &str = "file";

/// Derive the secret-store bucket id for an app/endpoint/profile triple.
///
/// Deterministic: identical inputs always produce the identical id; any
/// one differing input produces a different id. The base URL is normalized
/// (trailing slashes trimmed, ASCII-lowercased) before hashing so that
/// cosmetic URL differences do not split buckets.
pub fn bucket_id(app_id: &str, base_url: &str, config_path: &Path) -> String {
    let normalized = base_url.trim_end_matches('/').to_ascii_lowercase();
    let digest = Sha256::digest(
        format!("{}\n{}\n{}", app_id, normalized, config_path.display()).as_bytes(),
    );
    format!("stratus.{}", &hex::encode(digest)[..16])
}

/// The legacy bucket id scheme (config path only, no app id).
///
/// Readable for backward migration; never written.
pub fn legacy_bucket_id(config_path: &Path) -> String {
    let digest = Sha256::digest(config_path.display().to_string().as_bytes());
    format!("stratus.{}", &hex::encode(digest)[..16])
}

/// Create the token store selected by `keyring_backend` in the config.
///
/// # Errors
///
/// - [`SecretError::UnsupportedBackend`] for an unrecognized backend name
///   (never silently defaulted)
/// - [`SecretError::ProviderNotAvailable`] for `"keychain"` without the
///   `keychain` feature compiled in
pub fn create_store(cfg: &Config) -> Result<Box<dyn TokenStore>, SecretError> {
    match cfg.doc.keyring_backend.as_str() {
        "file" => Ok(Box::new(FileTokenStore::new())),
        #[cfg(feature = "keychain")]
        "keychain" => Ok(Box::new(KeychainTokenStore::new(cfg)?)),
        #[cfg(not(feature = "keychain"))]
        "keychain" => Err(SecretError::ProviderNotAvailable(
            "keychain support not enabled (compile with --features keychain)".into(),
        )),
        other => Err(SecretError::UnsupportedBackend(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn bucket_id_is_deterministic() {
        let path = PathBuf::from("/home/u/.stratus/config.toml");
        let a = bucket_id("cli_a", "https://open.stratus.dev", &path);
        let b = bucket_id("cli_a", "https://open.stratus.dev", &path);
        assert_eq!(a, b);
    }

    #[test]
    fn bucket_id_isolates_each_input() {
        let path = PathBuf::from("/home/u/.stratus/config.toml");
        let other_path = PathBuf::from("/home/u/.stratus/work.toml");
        let base = bucket_id("cli_a", "https://open.stratus.dev", &path);

        assert_ne!(base, bucket_id("cli_b", "https://open.stratus.dev", &path));
        assert_ne!(base, bucket_id("cli_a", "https://eu.stratus.dev", &path));
        assert_ne!(
            base,
            bucket_id("cli_a", "https://open.stratus.dev", &other_path)
        );
    }

    #[test]
    fn bucket_id_normalizes_base_url() {
        let path = PathBuf::from("/home/u/.stratus/config.toml");
        assert_eq!(
            bucket_id("cli_a", "https://open.stratus.dev/", &path),
            bucket_id("cli_a", "HTTPS://OPEN.STRATUS.DEV", &path),
        );
    }

    #[test]
    fn legacy_bucket_differs_from_current() {
        let path = PathBuf::from("/home/u/.stratus/config.toml");
        assert_ne!(
            legacy_bucket_id(&path),
            bucket_id("cli_a", "https://open.stratus.dev", &path)
        );
    }

    #[test]
    fn create_file_store() {
        let temp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(temp.path().join("config.toml")).unwrap();
        let store = create_store(&cfg).expect("file store");
        assert!(store.load(&mut cfg, "nobody").unwrap().is_none());
    }

    #[test]
    fn create_unknown_backend_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(temp.path().join("config.toml")).unwrap();
        cfg.doc.keyring_backend = "vault".into();

        match create_store(&cfg) {
            Err(SecretError::UnsupportedBackend(name)) => assert_eq!(name, "vault"),
            other => panic!("expected UnsupportedBackend, got {:?}", other.err()),
        }
    }

    #[cfg(not(feature = "keychain"))]
    #[test]
    fn create_keychain_without_feature() {
        let temp = TempDir::new().unwrap();
        let mut cfg = Config::load_from(temp.path().join("config.toml")).unwrap();
        cfg.doc.keyring_backend = "keychain".into();

        let err = create_store(&cfg).err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("keychain"));
        assert!(msg.contains("not enabled"));
    }
}
