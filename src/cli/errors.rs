//! CLI-specific error types
//!
//! Every CLI error is fatal: it is printed with its code and the process
//! exits non-zero.

use std::fmt;
use std::io;

use crate::config::ConfigError;

/// Stable codes printed ahead of every CLI failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Config missing, unreadable or invalid
    ConfigError,
    IoError,
    /// Config file already exists
    AlreadyInitialized,
    /// Server failed to start or stopped with an error
    ServeFailed,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "QUIRE_CLI_CONFIG_ERROR",
            Self::IoError => "QUIRE_CLI_IO_ERROR",
            Self::AlreadyInitialized => "QUIRE_CLI_ALREADY_INITIALIZED",
            Self::ServeFailed => "QUIRE_CLI_SERVE_FAILED",
        }
    }
}

/// Fatal CLI failure: a code plus a human-readable message
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn already_initialized(path: &std::path::Path) -> Self {
        Self::new(
            CliErrorCode::AlreadyInitialized,
            format!("{} already exists", path.display()),
        )
    }

    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(format!("{} ({:?})", e, e.kind()))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;
