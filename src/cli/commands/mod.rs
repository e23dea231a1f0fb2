//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each API-facing handler follows the same shape:
//!
//! 1. Scope preflight against the active account's granted scopes
//! 2. Obtain a valid user access token (cache, refresh, or override)
//! 3. Issue the Open API call
//! 4. On a scope-insufficiency error from the platform, append the same
//!    remediation shape the preflight produces
//!
//! Handlers that touch the network are async and bridge from the sync
//! dispatch layer with a per-command tokio runtime.

mod app;
mod auth;
mod completion;
mod contact;
mod drive;
mod im;
mod mail;

pub use auth::{account_list, account_remove, account_use, login, logout, status};
pub use completion::completion;

use anyhow::{Context as _, Result};

use crate::api::ApiError;
use crate::auth::manager::USER_TOKEN_ENV;
use crate::auth::policy::{self, Preflight};
use crate::auth::registry::SERVICES;
use crate::auth::{AccountManager, OAuthHttpClient, TokenManager};
use crate::core::config::Config;
use crate::secrets;
use crate::ui::output;

use super::args::{
    AccountCommand, AppCommand, AuthCommand, Command, ContactCommand, DriveCommand, ImCommand,
    MailCommand, UserCommand,
};
use super::Context;

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Auth { command } => match command {
            AuthCommand::User { command } => match command {
                UserCommand::Login {
                    scopes,
                    force_consent,
                    no_browser,
                    timeout_secs,
                } => login(ctx, scopes.as_deref(), force_consent, no_browser, timeout_secs),
                UserCommand::Logout => logout(ctx),
                UserCommand::Status => status(ctx),
            },
            AuthCommand::Account { command } => match command {
                AccountCommand::List => account_list(ctx),
                AccountCommand::Use { name } => account_use(ctx, &name),
                AccountCommand::Remove { name } => account_remove(ctx, &name),
            },
        },
        Command::Mail { command } => match command {
            MailCommand::Send { to, subject, body } => mail::send(ctx, &to, &subject, &body),
            MailCommand::List => mail::list(ctx),
        },
        Command::Drive { command } => match command {
            DriveCommand::List => drive::list(ctx),
        },
        Command::Im { command } => match command {
            ImCommand::Send { chat, text } => im::send(ctx, &chat, &text),
        },
        Command::Contact { command } => match command {
            ContactCommand::List => contact::list(ctx),
        },
        Command::App { command } => match command {
            AppCommand::Info => app::info(ctx),
        },
        Command::Completion { shell } => completion(shell),
    }
}

/// Resolve the active account and a valid user access token for a command.
///
/// Runs the scope preflight first so a doomed call never reaches the
/// network; fail-open outcomes are reported at debug verbosity only.
pub(crate) async fn user_token_for_command(
    ctx: &Context,
    cfg: &mut Config,
    command_path: &str,
    readonly: bool,
) -> Result<(String, String)> {
    let account = AccountManager::new(cfg).current(ctx.account.as_deref());
    let store = secrets::create_store(cfg).context("failed to initialize token store")?;

    let granted = store
        .load(cfg, &account)?
        .map(|record| record.scopes)
        .unwrap_or_default();

    match policy::preflight_command(SERVICES, command_path, readonly, &account, &granted)? {
        Preflight::Passed | Preflight::NotRequired => {}
        Preflight::SkippedUnknownGrant => {
            output::debug(
                format!(
                    "account '{}' has no recorded scopes; skipping preflight",
                    account
                ),
                ctx.verbosity,
            );
        }
        Preflight::SkippedUndeclared(services) => {
            output::debug(
                format!(
                    "services without declared scopes ({}); skipping preflight",
                    services.join(", ")
                ),
                ctx.verbosity,
            );
        }
    }

    let override_token = ctx
        .user_token
        .clone()
        .or_else(|| std::env::var(USER_TOKEN_ENV).ok());

    let base_url = cfg.doc.base_url.clone();
    let app_id = cfg.doc.app_id.clone();
    let app_secret = cfg.doc.app_secret.clone();
    let client = OAuthHttpClient::new(&base_url, &app_id, &app_secret);
    let mut manager = TokenManager::new(cfg, store, Box::new(client));
    let outcome = manager
        .user_access_token(&account, override_token.as_deref())
        .await?;

    if let Some(persist_error) = outcome.persist_error {
        output::warn(
            format!("refreshed token could not be persisted: {}", persist_error),
            ctx.verbosity,
        );
    }

    Ok((account, outcome.token))
}

/// Turn an API result into the command's outcome, appending scope
/// remediation when the platform reported an insufficient-scope error.
pub(crate) fn finish_api_result(
    result: Result<serde_json::Value, ApiError>,
    account: &str,
    command_path: &str,
    readonly: bool,
) -> Result<serde_json::Value> {
    match result {
        Ok(value) => Ok(value),
        Err(ApiError::Api { code, msg }) => {
            let required = policy::scopes_for_command(SERVICES, command_path, readonly).scopes;
            match policy::augment_scope_error(&msg, account, Some(&required)) {
                Some(augmented) => anyhow::bail!("api error {}: {}", code, augmented),
                None => anyhow::bail!("api error {}: {}", code, msg),
            }
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_api_result_passes_success_through() {
        let value = serde_json::json!({"ok": true});
        let result = finish_api_result(Ok(value.clone()), "work", "mail send", false).unwrap();
        assert_eq!(result, value);
    }

    #[test]
    fn finish_api_result_appends_remediation() {
        let err = finish_api_result(
            Err(ApiError::Api {
                code: 99991679,
                msg: "access denied, requires [mail:mail]".into(),
            }),
            "work",
            "mail send",
            false,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("access denied, requires [mail:mail]"));
        assert!(msg.contains("account 'work' is missing scopes"));
        assert!(msg.contains("--force-consent"));
    }

    #[test]
    fn finish_api_result_keeps_unrelated_errors() {
        let err = finish_api_result(
            Err(ApiError::Api {
                code: 99991400,
                msg: "rate limited".into(),
            }),
            "work",
            "mail send",
            false,
        )
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("rate limited"));
        assert!(!msg.contains("missing scopes"));
    }
}
