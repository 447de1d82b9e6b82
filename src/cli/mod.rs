//! CLI module for Quire
//!
//! Provides command-line interface for:
//! - init: Write a starter configuration
//! - check: Validate a configuration
//! - serve: Boot the REST server

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, init, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
