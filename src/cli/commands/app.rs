//! app commands - inspect the configured application.
//!
//! Tenant-only surface: authenticates with app credentials, so no user
//! scopes are involved and no user-scope preflight runs.

use anyhow::Result;

use crate::core::config::Config;
use crate::ui::output;

use super::super::Context;

/// Show the configured application.
pub fn info(ctx: &Context) -> Result<()> {
    let cfg = Config::load()?;

    output::print(
        format!(
            "App: {}",
            if cfg.doc.app_id.is_empty() {
                "(not configured)"
            } else {
                &cfg.doc.app_id
            }
        ),
        ctx.verbosity,
    );
    output::print(format!("Base URL: {}", cfg.doc.base_url), ctx.verbosity);
    output::print(
        format!("Token storage: {}", cfg.doc.keyring_backend),
        ctx.verbosity,
    );
    output::print(
        format!("Config file: {}", cfg.path().display()),
        ctx.verbosity,
    );
    Ok(())
}
