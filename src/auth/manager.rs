//! auth::manager
//!
//! Token lifecycle management: cached access, refresh, revocation.
//!
//! # State machine
//!
//! Per invocation: `NoCredential` → `Cached(valid)` → `Cached(expired)` →
//! `Refreshing` → `Refreshed | RefreshFailed`.
//!
//! - An externally supplied override token bypasses storage entirely and is
//!   never persisted.
//! - A stored access token with an expiry strictly in the future is
//!   returned without any network call. This is the dominant path.
//! - Refresh is attempted at most once per invocation; a rejected refresh
//!   clears all stored credentials before the error is surfaced, so a
//!   revoked refresh token is never silently retried later.
//!
//! # Persistence outcome
//!
//! When a refresh succeeds but persisting the rotated tokens fails, the
//! caller still receives the in-memory token; the persistence error rides
//! along in [`TokenOutcome::persist_error`] so read-path callers can warn
//! while login-path callers treat it as fatal.

use chrono::Utc;

use crate::core::config::Config;
use crate::secrets::{SecretError, TokenStore};

use super::errors::AuthError;
use super::oauth_client::RefreshClient;
use super::registry::{consented_services, SERVICES};
use super::scopes::ScopeSet;
use super::token_record::{RefreshMeta, TokenRecord};

/// Environment variable supplying an ad-hoc user access token for one
/// invocation. Bypasses the token store entirely.
pub const USER_TOKEN_ENV: &str = "STRATUS_USER_ACCESS_TOKEN";

/// A usable access token plus any non-fatal persistence error raised while
/// obtaining it.
#[derive(Debug)]
pub struct TokenOutcome {
    /// The bearer token to use for this invocation.
    pub token: String,

    /// Set when a successful refresh could not be persisted. The token is
    /// valid; the stored copy is stale.
    pub persist_error: Option<SecretError>,
}

/// Token lifecycle manager for user access tokens.
pub struct TokenManager<'a> {
    cfg: &'a mut Config,
    store: Box<dyn TokenStore>,
    client: Box<dyn RefreshClient>,
}

impl<'a> TokenManager<'a> {
    /// Create a manager over a config handle, token store, and refresh
    /// client.
    pub fn new(
        cfg: &'a mut Config,
        store: Box<dyn TokenStore>,
        client: Box<dyn RefreshClient>,
    ) -> Self {
        Self { cfg, store, client }
    }

    /// Return a currently-valid access token for the account.
    ///
    /// `override_token` (from a flag or [`USER_TOKEN_ENV`]) short-circuits
    /// everything and is never persisted.
    pub async fn user_access_token(
        &mut self,
        account: &str,
        override_token: Option<&str>,
    ) -> Result<TokenOutcome, AuthError> {
        if let Some(token) = override_token.filter(|t| !t.is_empty()) {
            return Ok(TokenOutcome {
                token: token.to_string(),
                persist_error: None,
            });
        }

        let record = self
            .store
            .load(self.cfg, account)?
            .ok_or_else(|| AuthError::NotLoggedIn(account.to_string()))?;

        let now = Utc::now().timestamp();
        if record.is_fresh(now) {
            return Ok(TokenOutcome {
                token: record.access_token,
                persist_error: None,
            });
        }

        if record.refresh_token.is_empty() {
            return Err(AuthError::RefreshTokenMissing(account.to_string()));
        }

        match self.client.refresh(&record.refresh_token).await {
            Ok(response) if !response.access_token.is_empty() && !response.refresh_token.is_empty() => {
                let now = Utc::now().timestamp();
                let scopes = if response.scope.is_empty() {
                    record.scopes.clone()
                } else {
                    response.scope.clone()
                };
                let granted = ScopeSet::parse(&scopes);

                let new_record = TokenRecord {
                    access_token: response.access_token,
                    refresh_token: response.refresh_token.clone(),
                    expires_at: now + response.expires_in,
                    scopes,
                    refresh_meta: Some(RefreshMeta {
                        refresh_token: response.refresh_token,
                        services: consented_services(SERVICES, &granted),
                        scopes: granted.to_scope_string(),
                        created_at: now,
                    }),
                };

                let persist_error = self
                    .store
                    .save(self.cfg, account, &new_record)
                    .err();

                Ok(TokenOutcome {
                    token: new_record.access_token,
                    persist_error,
                })
            }
            Ok(_) => self.reject(account, "malformed token response").await,
            Err(err) => self.reject(account, &err.to_string()).await,
        }
    }

    /// Clear stored credentials and surface the refresh rejection.
    async fn reject(&mut self, account: &str, cause: &str) -> Result<TokenOutcome, AuthError> {
        let mut cause = cause.to_string();
        if let Err(clear_err) = self.store.clear(self.cfg, account) {
            cause = format!("{}; also failed to clear stored credentials: {}", cause, clear_err);
        }
        Err(AuthError::RefreshRejected {
            account: account.to_string(),
            cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::oauth_client::TokenResponse;
    use crate::secrets::FileTokenStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Refresh client returning a canned response and counting calls.
    struct MockRefresh {
        calls: Arc<AtomicUsize>,
        result: Result<TokenResponse, String>,
    }

    #[async_trait]
    impl RefreshClient for MockRefresh {
        async fn refresh(&self, _refresh_token: &str) -> Result<TokenResponse, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(response) => Ok(response.clone()),
                Err(msg) => Err(AuthError::ExchangeFailed(msg.clone())),
            }
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn mock_ok(calls: &Arc<AtomicUsize>, response: TokenResponse) -> Box<MockRefresh> {
        Box::new(MockRefresh {
            calls: calls.clone(),
            result: Ok(response),
        })
    }

    fn mock_err(calls: &Arc<AtomicUsize>, msg: &str) -> Box<MockRefresh> {
        Box::new(MockRefresh {
            calls: calls.clone(),
            result: Err(msg.to_string()),
        })
    }

    fn test_config() -> (TempDir, Config) {
        let temp = TempDir::new().expect("create temp dir");
        let config = Config::load_from(temp.path().join("config.toml")).expect("load config");
        (temp, config)
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }

    fn seed(cfg: &mut Config, account: &str, record: &TokenRecord) {
        FileTokenStore::new().save(cfg, account, record).unwrap();
    }

    fn good_response() -> TokenResponse {
        TokenResponse {
            access_token: "u-new".into(),
            refresh_token: "r-new".into(),
            expires_in: 7200,
            token_type: "Bearer".into(),
            scope: "offline_access mail:mail".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn override_token_bypasses_store() {
        let (_temp, mut cfg) = test_config();
        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, good_response()),
        );

        let outcome = mgr
            .user_access_token("nobody", Some("u-override"))
            .await
            .unwrap();
        assert_eq!(outcome.token, "u-override");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        // Nothing was persisted
        assert!(cfg.doc.accounts.is_empty());
    }

    #[tokio::test]
    async fn cache_hit_makes_no_refresh_call() {
        let (_temp, mut cfg) = test_config();
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-cached".into(),
                refresh_token: "r-1".into(),
                expires_at: now() + 3600,
                ..Default::default()
            },
        );

        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, good_response()),
        );

        let outcome = mgr.user_access_token("work", None).await.unwrap();
        assert_eq!(outcome.token, "u-cached");
        assert!(outcome.persist_error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_record_is_not_logged_in() {
        let (_temp, mut cfg) = test_config();
        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, good_response()),
        );

        let err = mgr.user_access_token("work", None).await.unwrap_err();
        assert!(matches!(err, AuthError::NotLoggedIn(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_fast_without_network() {
        let (_temp, mut cfg) = test_config();
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-stale".into(),
                refresh_token: String::new(),
                expires_at: now() - 10,
                ..Default::default()
            },
        );

        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, good_response()),
        );

        let err = mgr.user_access_token("work", None).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("no refresh token stored for account 'work'"));
        assert!(msg.contains("stratus auth user login"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn refresh_rotates_tokens_and_metadata() {
        let (_temp, mut cfg) = test_config();
        let prior_created_at = now() - 86_400;
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-old".into(),
                refresh_token: "r-old".into(),
                expires_at: now() - 10,
                scopes: "offline_access mail:mail".into(),
                refresh_meta: Some(RefreshMeta {
                    refresh_token: "r-old".into(),
                    services: vec!["mail".into()],
                    scopes: "offline_access mail:mail".into(),
                    created_at: prior_created_at,
                }),
            },
        );

        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, good_response()),
        );

        let outcome = mgr.user_access_token("work", None).await.unwrap();
        assert_eq!(outcome.token, "u-new");
        assert!(outcome.persist_error.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let stored = FileTokenStore::new()
            .load(&mut cfg, "work")
            .unwrap()
            .expect("record");
        assert_eq!(stored.access_token, "u-new");
        assert_eq!(stored.refresh_token, "r-new");
        assert_ne!(stored.refresh_token, "r-old");
        assert!(stored.expires_at > now());

        let meta = stored.refresh_meta.expect("metadata");
        assert_eq!(meta.refresh_token, "r-new");
        assert!(meta.created_at > prior_created_at);
        assert_eq!(meta.services, vec!["mail"]);
    }

    #[tokio::test]
    async fn rejected_refresh_clears_all_credentials() {
        let (_temp, mut cfg) = test_config();
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-old".into(),
                refresh_token: "r-old".into(),
                expires_at: now() - 10,
                scopes: "offline_access".into(),
                refresh_meta: Some(RefreshMeta {
                    refresh_token: "r-old".into(),
                    services: vec![],
                    scopes: "offline_access".into(),
                    created_at: now() - 100,
                }),
            },
        );

        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_err(&calls, "invalid_grant: refresh token is revoked"),
        );

        let err = mgr.user_access_token("work", None).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("refresh token revoked or expired"));
        assert!(msg.contains("stratus auth user login"));

        // Every credential field was reset
        assert!(FileTokenStore::new()
            .load(&mut cfg, "work")
            .unwrap()
            .is_none());
        let entry = cfg.doc.accounts.get("work").expect("shell kept");
        assert!(entry.user_access_token.is_empty());
        assert!(entry.refresh_token.is_empty());
        assert_eq!(entry.token_expires_at, 0);
        assert!(entry.refresh_meta.is_none());
    }

    #[tokio::test]
    async fn malformed_refresh_response_is_rejection() {
        let (_temp, mut cfg) = test_config();
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-old".into(),
                refresh_token: "r-old".into(),
                expires_at: now() - 10,
                ..Default::default()
            },
        );

        // Response without a rotated refresh token
        let calls = counter();
        let response = TokenResponse {
            access_token: "u-new".into(),
            ..Default::default()
        };
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FileTokenStore::new()),
            mock_ok(&calls, response),
        );

        let err = mgr.user_access_token("work", None).await.unwrap_err();
        assert!(err.to_string().contains("refresh token revoked or expired"));
        assert!(FileTokenStore::new()
            .load(&mut cfg, "work")
            .unwrap()
            .is_none());
    }

    /// Store whose save always fails, for the persist-outcome contract.
    struct FailingSaveStore;

    impl TokenStore for FailingSaveStore {
        fn load(
            &self,
            cfg: &mut Config,
            account: &str,
        ) -> Result<Option<TokenRecord>, SecretError> {
            FileTokenStore::new().load(cfg, account)
        }

        fn save(
            &self,
            _cfg: &mut Config,
            _account: &str,
            _record: &TokenRecord,
        ) -> Result<(), SecretError> {
            Err(SecretError::WriteError("disk full".into()))
        }

        fn clear(&self, cfg: &mut Config, account: &str) -> Result<(), SecretError> {
            FileTokenStore::new().clear(cfg, account)
        }
    }

    #[tokio::test]
    async fn persist_failure_still_returns_refreshed_token() {
        let (_temp, mut cfg) = test_config();
        seed(
            &mut cfg,
            "work",
            &TokenRecord {
                access_token: "u-old".into(),
                refresh_token: "r-old".into(),
                expires_at: now() - 10,
                ..Default::default()
            },
        );

        let calls = counter();
        let mut mgr = TokenManager::new(
            &mut cfg,
            Box::new(FailingSaveStore),
            mock_ok(&calls, good_response()),
        );

        let outcome = mgr.user_access_token("work", None).await.unwrap();
        assert_eq!(outcome.token, "u-new");
        let persist_error = outcome.persist_error.expect("persistence error surfaced");
        assert!(persist_error.to_string().contains("disk full"));
    }
}
