//! auth commands - login, logout, status, and account management.
//!
//! # Design
//!
//! Login drives the browser-based authorization flow and persists the
//! resulting token pair through the configured token store. Tokens are
//! NEVER printed; status output shows only non-sensitive metadata.

use anyhow::{bail, Context as _, Result};
use chrono::{TimeZone, Utc};
use std::time::Duration;

use crate::auth::flow::{epoch_now, record_from_response, LoginFlow};
use crate::auth::{AccountManager, OAuthHttpClient, ScopeSet};
use crate::core::config::Config;
use crate::secrets;
use crate::ui::output;

use super::super::Context;

/// Run the interactive browser login and store the tokens.
pub fn login(
    ctx: &Context,
    scopes: Option<&str>,
    force_consent: bool,
    no_browser: bool,
    timeout_secs: u64,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(login_async(ctx, scopes, force_consent, no_browser, timeout_secs))
}

async fn login_async(
    ctx: &Context,
    scopes: Option<&str>,
    force_consent: bool,
    no_browser: bool,
    timeout_secs: u64,
) -> Result<()> {
    let mut cfg = Config::load()?;
    let (app_id, app_secret) = cfg.app_credentials()?;
    let client = OAuthHttpClient::new(&cfg.doc.base_url, app_id, app_secret);

    let requested = match scopes {
        Some(raw) => ScopeSet::parse(raw),
        None if cfg.doc.default_scopes.is_empty() => ScopeSet::sentinel_only(),
        None => ScopeSet::from_scopes(cfg.doc.default_scopes.clone()),
    };

    let flow = LoginFlow {
        scopes: requested.clone(),
        force_consent,
        timeout: Duration::from_secs(timeout_secs),
        ..Default::default()
    };
    let pending = flow.start(&client).await?;

    if no_browser {
        output::print("Open this URL in your browser to sign in:", ctx.verbosity);
        output::print(&pending.authorize_url, ctx.verbosity);
    } else if pending.open_browser() {
        output::print(
            "Opening your browser to sign in. If nothing happens, visit:",
            ctx.verbosity,
        );
        output::print(&pending.authorize_url, ctx.verbosity);
    } else {
        output::warn("could not open a browser automatically", ctx.verbosity);
        output::print("Open this URL in your browser to sign in:", ctx.verbosity);
        output::print(&pending.authorize_url, ctx.verbosity);
    }

    let response = pending.finish(&client).await?;
    let record = record_from_response(&response, &requested, epoch_now());

    let account = AccountManager::new(&mut cfg).current(ctx.account.as_deref());
    let store = secrets::create_store(&cfg).context("failed to initialize token store")?;
    // Login exists to persist; a storage failure here is fatal.
    store.save(&mut cfg, &account, &record)?;
    let mut manager = AccountManager::new(&mut cfg);
    let entry = manager.get(&account).cloned().unwrap_or_default();
    manager.save(&account, entry)?;

    output::print(
        format!("Logged in as account '{}'.", account),
        ctx.verbosity,
    );
    output::print(format!("Granted scopes: {}", record.scopes), ctx.verbosity);
    Ok(())
}

/// Clear stored tokens for the selected account, keeping the account.
pub fn logout(ctx: &Context) -> Result<()> {
    let mut cfg = Config::load()?;
    let account = AccountManager::new(&mut cfg).current(ctx.account.as_deref());
    let store = secrets::create_store(&cfg).context("failed to initialize token store")?;

    AccountManager::new(&mut cfg).clear_tokens(&account, store.as_ref())?;
    output::print(
        format!("Logged out account '{}'.", account),
        ctx.verbosity,
    );
    Ok(())
}

/// Show credential state for the selected account.
pub fn status(ctx: &Context) -> Result<()> {
    let mut cfg = Config::load()?;
    let account = AccountManager::new(&mut cfg).current(ctx.account.as_deref());
    let store = secrets::create_store(&cfg).context("failed to initialize token store")?;

    let Some(record) = store.load(&mut cfg, &account)? else {
        output::print(
            format!("Account '{}' is not logged in.", account),
            ctx.verbosity,
        );
        output::print("Run `stratus auth user login` to sign in.", ctx.verbosity);
        return Ok(());
    };

    output::print(format!("Account: {}", account), ctx.verbosity);
    let expiry = Utc
        .timestamp_opt(record.expires_at, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    let state = if record.is_fresh(epoch_now()) {
        "valid"
    } else {
        "expired (will refresh on next use)"
    };
    output::print(
        format!("Access token: {} (expires {})", state, expiry),
        ctx.verbosity,
    );
    output::print(
        format!(
            "Refresh token: {}",
            if record.refresh_token.is_empty() {
                "absent"
            } else {
                "present"
            }
        ),
        ctx.verbosity,
    );
    if !record.scopes.is_empty() {
        output::print(format!("Granted scopes: {}", record.scopes), ctx.verbosity);
    }
    if let Some(meta) = record.refresh_meta {
        if !meta.services.is_empty() {
            output::print(
                format!("Consented services: {}", meta.services.join(", ")),
                ctx.verbosity,
            );
        }
    }
    Ok(())
}

/// List known accounts, marking the default.
pub fn account_list(ctx: &Context) -> Result<()> {
    let mut cfg = Config::load()?;
    let manager = AccountManager::new(&mut cfg);
    let names = manager.names();
    let default = cfg.doc.default_account.clone();

    for name in names {
        let marker = if name == default { "*" } else { " " };
        output::print(format!("{} {}", marker, name), ctx.verbosity);
    }
    Ok(())
}

/// Make an account the configured default.
pub fn account_use(ctx: &Context, name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("account name cannot be empty");
    }

    let mut cfg = Config::load()?;
    AccountManager::new(&mut cfg).set_default(name)?;
    output::print(
        format!("Default account is now '{}'.", name),
        ctx.verbosity,
    );
    Ok(())
}

/// Delete an account and purge its stored tokens.
pub fn account_remove(ctx: &Context, name: &str) -> Result<()> {
    let mut cfg = Config::load()?;
    if !cfg.doc.accounts.contains_key(name) && cfg.doc.default_account != name {
        bail!("account '{}' not found; run `stratus auth account list`", name);
    }
    let store = secrets::create_store(&cfg).context("failed to initialize token store")?;

    AccountManager::new(&mut cfg).delete(name, store.as_ref())?;
    output::print(format!("Removed account '{}'.", name), ctx.verbosity);
    Ok(())
}
