//! Stratus CLI - a command-line client for the Stratus Open Platform
//!
//! Stratus is a single-binary tool for driving the Stratus Open Platform
//! APIs (mail, drive, messaging, contact, calendar) from the terminal,
//! authenticated as a named user identity via OAuth2.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to handlers)
//! - [`auth`] - User-identity authentication: accounts, scopes, token lifecycle,
//!   the interactive authorization flow, and the scope policy engine
//! - [`secrets`] - Token storage backends (config file, OS keychain)
//! - [`core`] - Configuration schema and loading
//! - [`api`] - Thin bearer-authenticated Open API client
//! - [`ui`] - Output utilities
//!
//! # Correctness Invariants
//!
//! 1. Tokens never appear in logs, errors, or debug output
//! 2. All account mutation flows through the account manager's get/save pair
//! 3. A refresh rejection always clears stored credentials before surfacing
//! 4. Scope-insufficiency errors always carry a concrete re-login command

pub mod api;
pub mod auth;
pub mod cli;
pub mod core;
pub mod secrets;
pub mod ui;
