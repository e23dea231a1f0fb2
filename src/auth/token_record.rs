//! auth::token_record
//!
//! The per-account token record persisted by the token stores.
//!
//! # Storage forms
//!
//! - File backend: the fields are embedded directly in the account's
//!   configuration entry.
//! - Keychain backend: the record is JSON-serialized and stored under
//!   `<bucket_id>:<account>`.
//!
//! # Security
//!
//! Both structs implement custom `Debug` that redacts token values. The
//! JSON form necessarily contains them (that is the storage format); it
//! must never be logged.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::AuthError;

/// Token record for one account.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    /// User access token (secret).
    pub access_token: String,

    /// Refresh token (secret). Rotates on every refresh.
    pub refresh_token: String,

    /// Absolute access-token expiry, epoch seconds. Zero when unset.
    pub expires_at: i64,

    /// Space-delimited granted-scope string.
    pub scopes: String,

    /// Metadata recorded alongside the refresh token.
    pub refresh_meta: Option<RefreshMeta>,
}

/// Refresh-token metadata captured at grant/refresh time.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct RefreshMeta {
    /// Copy of the refresh token this metadata describes (secret).
    pub refresh_token: String,

    /// Services consented to when the token was granted.
    pub services: Vec<String>,

    /// Scope string at grant time.
    pub scopes: String,

    /// When the refresh token was issued, epoch seconds.
    pub created_at: i64,
}

impl TokenRecord {
    /// Whether every field is empty/zero.
    ///
    /// The file backend treats an all-empty record as "not found".
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
            && self.refresh_token.is_empty()
            && self.expires_at == 0
            && self.scopes.is_empty()
            && self.refresh_meta.is_none()
    }

    /// Whether the access token is present and strictly unexpired at `now`.
    ///
    /// No grace skew: an access token expiring exactly at `now` is stale.
    pub fn is_fresh(&self, now: i64) -> bool {
        !self.access_token.is_empty() && self.expires_at > now
    }

    /// Parse a record from its keychain JSON form.
    pub fn parse(json: &str) -> Result<Self, AuthError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the record to its keychain JSON form.
    pub fn to_json(&self) -> Result<String, AuthError> {
        Ok(serde_json::to_string(self)?)
    }
}

// Custom Debug implementations to redact tokens

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .field("refresh_meta", &self.refresh_meta)
            .finish()
    }
}

impl fmt::Debug for RefreshMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshMeta")
            .field("refresh_token", &"[REDACTED]")
            .field("services", &self.services)
            .field("scopes", &self.scopes)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record() -> TokenRecord {
        TokenRecord {
            access_token: "u-access".into(),
            refresh_token: "r-refresh".into(),
            expires_at: 1_765_432_100,
            scopes: "offline_access mail:mail".into(),
            refresh_meta: Some(RefreshMeta {
                refresh_token: "r-refresh".into(),
                services: vec!["mail".into()],
                scopes: "offline_access mail:mail".into(),
                created_at: 1_765_428_500,
            }),
        }
    }

    #[test]
    fn default_record_is_empty() {
        assert!(TokenRecord::default().is_empty());
    }

    #[test]
    fn populated_record_is_not_empty() {
        assert!(!make_record().is_empty());

        // A single populated field is enough
        let record = TokenRecord {
            expires_at: 1,
            ..Default::default()
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn freshness_is_strict() {
        let record = make_record();
        assert!(record.is_fresh(record.expires_at - 1));
        assert!(!record.is_fresh(record.expires_at));
        assert!(!record.is_fresh(record.expires_at + 1));
    }

    #[test]
    fn freshness_requires_access_token() {
        let record = TokenRecord {
            expires_at: i64::MAX,
            ..Default::default()
        };
        assert!(!record.is_fresh(0));
    }

    #[test]
    fn json_roundtrip() {
        let record = make_record();
        let json = record.to_json().unwrap();
        let parsed = TokenRecord::parse(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TokenRecord::parse("not json").is_err());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let record = make_record();
        let debug_output = format!("{:?}", record);

        assert!(!debug_output.contains("u-access"));
        assert!(!debug_output.contains("r-refresh"));
        assert!(debug_output.contains("[REDACTED]"));
        // Non-sensitive fields stay visible
        assert!(debug_output.contains("mail:mail"));
    }
}
