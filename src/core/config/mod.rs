//! core::config
//!
//! Configuration loading and persistence.
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$STRATUS_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/stratus/config.toml`
//! 3. `~/.stratus/config.toml` (canonical write location)
//!
//! # Handle semantics
//!
//! [`Config`] is an explicitly threaded handle: it owns the parsed document
//! and remembers the path it was loaded from. Every component that mutates
//! account state receives `&mut Config` and persists through
//! [`Config::save`]; nothing reads or writes the file behind the handle's
//! back. The path also participates in the token-bucket identity (see
//! [`crate::secrets::bucket_id`]), so two profiles never share keychain
//! entries.
//!
//! # Example
//!
//! ```no_run
//! use stratus_cli::core::config::Config;
//!
//! let mut config = Config::load().unwrap();
//! config.doc.default_account = "work".to_string();
//! config.save().unwrap();
//! ```

pub mod schema;

pub use schema::{AccountEntry, ConfigDoc, DEFAULT_ACCOUNT};

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "STRATUS_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("app_id is not configured. Set `app_id` and `app_secret` in the config file.")]
    MissingAppCredentials,

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded configuration plus the path it round-trips through.
#[derive(Debug, Clone)]
pub struct Config {
    /// The parsed document.
    pub doc: ConfigDoc,
    /// Path this config was loaded from and will be saved to.
    path: PathBuf,
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// A missing file is not an error: defaults are used and the canonical
    /// path becomes the write target.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::resolve_path()?;
        Self::load_from(path)
    }

    /// Load configuration from an explicit path.
    ///
    /// Used by tests and by `$STRATUS_CONFIG`.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self {
                doc: ConfigDoc::default(),
                path,
            });
        }

        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let doc = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            message: e.to_string(),
        })?;

        Ok(Self { doc, path })
    }

    /// Resolve the config path from env and standard locations.
    fn resolve_path() -> Result<PathBuf, ConfigError> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(explicit));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("stratus/config.toml");
            if path.exists() {
                return Ok(path);
            }
        }

        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".stratus/config.toml"))
    }

    /// The path this config round-trips through.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Require app credentials to be present.
    pub fn app_credentials(&self) -> Result<(&str, &str), ConfigError> {
        if self.doc.app_id.is_empty() || self.doc.app_secret.is_empty() {
            return Err(ConfigError::MissingAppCredentials);
        }
        Ok((&self.doc.app_id, &self.doc.app_secret))
    }

    /// Persist the document atomically (temp file + rename).
    ///
    /// The file carries 0600 permissions on Unix since token fields may be
    /// embedded when the file backend is active.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(&self.doc).map_err(|e| ConfigError::ParseError {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        let temp_path = self.path.with_extension("toml.tmp");
        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(|e| ConfigError::WriteError {
                    path: temp_path.clone(),
                    source: e,
                })?;

            #[cfg(unix)]
            {
                let permissions = fs::Permissions::from_mode(0o600);
                file.set_permissions(permissions)
                    .map_err(|e| ConfigError::WriteError {
                        path: temp_path.clone(),
                        source: e,
                    })?;
            }

            file.write_all(contents.as_bytes())
                .map_err(|e| ConfigError::WriteError {
                    path: temp_path.clone(),
                    source: e,
                })?;

            file.sync_all().map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| ConfigError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let config = Config::load_from(path.clone()).unwrap();
        assert_eq!(config.doc, ConfigDoc::default());
        assert_eq!(config.path(), path);
    }

    #[test]
    fn save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::load_from(path.clone()).unwrap();
        config.doc.app_id = "cli_test".into();
        config.doc.default_account = "work".into();
        config.save().unwrap();

        let reloaded = Config::load_from(path).unwrap();
        assert_eq!(reloaded.doc.app_id, "cli_test");
        assert_eq!(reloaded.doc.default_account, "work");
    }

    #[test]
    fn save_creates_parent_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/config.toml");

        let config = Config::load_from(path.clone()).unwrap();
        config.save().unwrap();

        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_has_0600_permissions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let config = Config::load_from(path.clone()).unwrap();
        config.save().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn parse_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "keyring_backend = [broken").unwrap();

        let err = Config::load_from(path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn app_credentials_required() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::load_from(path).unwrap();
        assert!(config.app_credentials().is_err());

        config.doc.app_id = "cli_test".into();
        config.doc.app_secret = "s3cret".into();
        let (id, secret) = config.app_credentials().unwrap();
        assert_eq!(id, "cli_test");
        assert_eq!(secret, "s3cret");
    }
}
