//! core
//!
//! Configuration schema and loading.

pub mod config;
