//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! handlers; the scope preflight, token lifecycle, and storage all live in
//! [`crate::auth`] and [`crate::secrets`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use anyhow::Result;

use crate::ui::output::Verbosity;

/// Per-invocation context derived from global flags.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit account selection (`--account`).
    pub account: Option<String>,

    /// Ad-hoc user token (`--user-access-token`); never persisted.
    pub user_token: Option<String>,

    /// Output verbosity derived from `--quiet`/`--debug`.
    pub verbosity: Verbosity,
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = Context {
        account: cli.account.clone(),
        user_token: cli.user_access_token.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
