//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! Available on all commands:
//! - `--account <name>`: operate as a named account
//! - `--user-access-token <token>`: ad-hoc token for this invocation
//! - `--debug`: enable debug output
//! - `--quiet` / `-q`: minimal output

use clap::{Parser, Subcommand, ValueEnum};

/// Stratus - a command-line client for the Stratus Open Platform
#[derive(Parser, Debug)]
#[command(name = "stratus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Account to operate as (overrides $STRATUS_ACCOUNT and the default)
    #[arg(long, global = true, value_name = "NAME")]
    pub account: Option<String>,

    /// Use this user access token for one invocation; never persisted
    #[arg(long, global = true, value_name = "TOKEN")]
    pub user_access_token: Option<String>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage authentication and accounts
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Send and list mail
    Mail {
        #[command(subcommand)]
        command: MailCommand,
    },

    /// Browse drive files
    Drive {
        #[command(subcommand)]
        command: DriveCommand,
    },

    /// Send messages
    Im {
        #[command(subcommand)]
        command: ImCommand,
    },

    /// Look up contacts
    Contact {
        #[command(subcommand)]
        command: ContactCommand,
    },

    /// Inspect the configured application
    App {
        #[command(subcommand)]
        command: AppCommand,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Authentication commands.
#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// User-identity credentials
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Named accounts
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
}

/// User-identity credential commands.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Sign in through the browser and store user tokens
    #[command(
        long_about = "Sign in through the browser and store user tokens.\n\n\
            Opens the platform's authorization page, waits for the redirect \
            on a local callback port, and stores the resulting token pair \
            for the selected account. Offline access is always requested so \
            tokens can be refreshed without another sign-in."
    )]
    Login {
        /// Scopes to request, space- or comma-separated
        #[arg(long, value_name = "SCOPES")]
        scopes: Option<String>,

        /// Force the consent screen even if previously granted
        #[arg(long)]
        force_consent: bool,

        /// Do not open a browser automatically; print the URL instead
        #[arg(long)]
        no_browser: bool,

        /// Seconds to wait for the browser callback
        #[arg(long, default_value_t = 300, value_name = "SECS")]
        timeout_secs: u64,
    },

    /// Clear stored user tokens for the selected account
    Logout,

    /// Show stored credential state for the selected account
    Status,
}

/// Account management commands.
#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    /// List known accounts
    List,

    /// Make an account the default
    Use {
        /// Account name
        name: String,
    },

    /// Delete an account and purge its stored tokens
    Remove {
        /// Account name
        name: String,
    },
}

/// Mail commands.
#[derive(Subcommand, Debug)]
pub enum MailCommand {
    /// Send a message
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Subject line
        #[arg(long)]
        subject: String,

        /// Message body
        #[arg(long)]
        body: String,
    },

    /// List recent messages
    List,
}

/// Drive commands.
#[derive(Subcommand, Debug)]
pub enum DriveCommand {
    /// List files
    List,
}

/// Messaging commands.
#[derive(Subcommand, Debug)]
pub enum ImCommand {
    /// Send a chat message
    Send {
        /// Chat id
        #[arg(long)]
        chat: String,

        /// Message text
        #[arg(long)]
        text: String,
    },
}

/// Contact commands.
#[derive(Subcommand, Debug)]
pub enum ContactCommand {
    /// List contacts
    List,
}

/// Application commands (tenant credentials; no user scopes involved).
#[derive(Subcommand, Debug)]
pub enum AppCommand {
    /// Show application info
    Info,
}

/// Supported completion shells.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
