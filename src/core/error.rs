//! Core Error Types
//!
//! Unified error handling for the operation pipeline. Stages never wrap
//! or remap each other's errors; whatever a stage returns reaches the caller.

use thiserror::Error;

use crate::auth::AuthError;
use crate::schema::ValidationError;
use crate::store::StoreError;

/// Core module result type
pub type CmsResult<T> = Result<T, CmsError>;

/// Core error type
#[derive(Debug, Clone, Error)]
pub enum CmsError {
    /// Access denied by policy
    #[error("You are not allowed to perform this action")]
    Forbidden,

    /// No matching document
    #[error("The requested resource was not found")]
    NotFound,

    /// Slug does not name a configured collection
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// Slug does not name a configured global
    #[error("Unknown global: {0}")]
    UnknownGlobal(String),

    /// Locale is not one of the configured locales
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    /// Arguments are missing or malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Document failed schema validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Raised by a user-supplied hook or policy
    #[error("{message}")]
    Hook { message: String, status: u16 },

    /// Authentication failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Store adapter failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CmsError {
    /// Create an error from inside a hook with a 500 status
    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
            status: 500,
        }
    }

    /// Create an error from inside a hook with an explicit status
    pub fn hook_with_status(message: impl Into<String>, status: u16) -> Self {
        Self::Hook {
            message: message.into(),
            status,
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::UnknownCollection(_) => "UNKNOWN_COLLECTION",
            Self::UnknownGlobal(_) => "UNKNOWN_GLOBAL",
            Self::InvalidLocale(_) => "INVALID_LOCALE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Hook { .. } => "HOOK_ERROR",
            Self::Auth(e) => e.code(),
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::UnknownCollection(_) => 404,
            Self::UnknownGlobal(_) => 404,
            Self::InvalidLocale(_) => 400,
            Self::InvalidRequest(_) => 400,
            Self::Validation(_) => 400,
            Self::Hook { status, .. } => *status,
            Self::Auth(e) => e.status_code(),
            Self::Store(_) => 500,
            Self::Internal(_) => 500,
        }
    }

    /// Whether the failure was caused by the caller
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<serde_json::Error> for CmsError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}
