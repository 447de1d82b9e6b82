//! Schema validation errors
//!
//! A failed validation reports every offending field at once, each with
//! its dotted path (`meta.title`, `rows.1.label`).

use serde::Serialize;
use thiserror::Error;

/// One field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path to the field
    pub path: String,
    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn required(path: impl Into<String>) -> Self {
        Self::new(path, "This field is required")
    }

    pub(crate) fn unknown(path: impl Into<String>) -> Self {
        Self::new(path, "Unknown field")
    }

    pub(crate) fn type_mismatch(path: impl Into<String>, expected: &str, actual: &str) -> Self {
        Self::new(path, format!("Expected {}, got {}", expected, actual))
    }
}

/// Document failed schema validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The following field(s) are invalid: {}", field_paths(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    /// Single-field error, for checks made outside the validator
    pub fn field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(path, message)])
    }

    /// Whether the error mentions the given path
    pub fn has_path(&self, path: &str) -> bool {
        self.errors.iter().any(|e| e.path == path)
    }
}

fn field_paths(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.path.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;
