//! # Document Store
//!
//! The persistence port used by the operation pipeline, plus the
//! in-memory adapter shipped with the crate.
//!
//! The store is schema-aware only as far as relationship population needs:
//! validation, access control and localization all happen above it.

mod document;
mod errors;
mod filter;
mod memory;
mod populate;
mod query;
mod sort;

use futures_util::future::BoxFuture;
use serde_json::{Map, Value};

pub use document::StoredDocument;
pub use errors::{StoreError, StoreResult};
pub use filter::{lookup_path, FilterExpr, FilterOperator};
pub use memory::InMemoryStore;
pub use query::{Autopopulate, FindQuery, FindResult, QueryOptions, QueryTarget, StoreQuery};
pub use sort::{sort_by_specs, SortSpec};

/// Persistence port
///
/// Every method resolves once; implementations provide their own
/// consistency between concurrent requests.
pub trait DocumentStore: Send + Sync {
    /// Single-document lookup; `None` when nothing matches
    fn find_one(&self, query: StoreQuery) -> BoxFuture<'_, StoreResult<Option<StoredDocument>>>;

    /// Filtered, sorted, paginated lookup
    fn find(&self, query: FindQuery) -> BoxFuture<'_, StoreResult<FindResult>>;

    /// Insert a new collection document and return it
    fn create<'a>(
        &'a self,
        collection: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>>;

    /// Replace a document's data; `None` when the id is unknown
    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>>;

    /// Remove a document and return it; `None` when the id is unknown
    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>>;

    /// Create or replace a global singleton's data
    fn upsert_global<'a>(
        &'a self,
        global_type: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>>;
}
