//! Schema subsystem
//!
//! Collections and globals are declared as typed field lists. Every write
//! is validated against the declaring schema before it reaches the store.
//!
//! # Design Principles
//!
//! - Validation happens on the merged document, never a partial patch
//! - All field errors are reported together
//! - Defaults are applied on create only
//! - Hidden fields never leave the server

mod catalog;
mod errors;
mod types;
mod validator;

pub use catalog::SchemaCatalog;
pub use errors::{FieldError, ValidationError, ValidationResult};
pub use types::{
    find_field, has_localized_fields, Block, CollectionSchema, Field, FieldType, GlobalSchema,
    RESERVED_KEYS,
};
pub use validator::{apply_defaults, strip_hidden, DocumentValidator};
