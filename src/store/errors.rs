//! Store errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by a document store adapter
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No schema registered for the slug
    #[error("No schema registered for '{0}'")]
    UnknownSchema(String),

    /// Data handed to the store is not a JSON object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Adapter-specific failure
    #[error("Store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            StoreError::UnknownSchema(_) => "STORE_UNKNOWN_SCHEMA",
            StoreError::InvalidDocument(_) => "STORE_INVALID_DOCUMENT",
            StoreError::Backend(_) => "STORE_BACKEND",
        }
    }
}
