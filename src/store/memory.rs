//! In-memory document store
//!
//! Collections keep insertion order so unsorted queries are stable.
//! All access goes through one `RwLock`; population reads a consistent
//! snapshot of every collection under the same read guard.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::BoxFuture;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::schema::{Field, SchemaCatalog};

use super::document::StoredDocument;
use super::errors::{StoreError, StoreResult};
use super::filter::FilterExpr;
use super::populate::Populator;
use super::query::{Autopopulate, FindQuery, FindResult, QueryTarget, StoreQuery};
use super::sort::sort_by_specs;
use super::DocumentStore;

#[derive(Default)]
struct MemoryState {
    collections: HashMap<String, Vec<StoredDocument>>,
    globals: HashMap<String, StoredDocument>,
}

/// Store adapter backed by process memory
pub struct InMemoryStore {
    catalog: Arc<SchemaCatalog>,
    state: RwLock<MemoryState>,
    default_depth: u32,
}

impl InMemoryStore {
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            state: RwLock::new(MemoryState::default()),
            default_depth: 0,
        }
    }

    /// Population depth used when a query asks for the store default
    pub fn with_default_depth(mut self, depth: u32) -> Self {
        self.default_depth = depth;
        self
    }

    pub fn default_depth(&self) -> u32 {
        self.default_depth
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> usize {
        let state = self.state.read().await;
        state.collections.get(collection).map(Vec::len).unwrap_or(0)
    }

    /// Copy of `doc` with relationships populated to the requested depth
    fn hydrate(
        &self,
        state: &MemoryState,
        doc: &StoredDocument,
        fields: &[Field],
        autopopulate: Autopopulate,
    ) -> StoredDocument {
        let mut doc = doc.clone();
        let depth = autopopulate.depth(self.default_depth);
        Populator::new(&self.catalog, &state.collections).populate(fields, &mut doc.data, depth);
        doc
    }

    fn collection_fields(&self, collection: &str) -> StoreResult<&[Field]> {
        self.catalog
            .collection(collection)
            .map(|c| c.fields.as_slice())
            .ok_or_else(|| StoreError::UnknownSchema(collection.to_string()))
    }
}

fn matches_all(doc: &StoredDocument, filter: &[FilterExpr]) -> bool {
    if filter.is_empty() {
        return true;
    }
    let view = doc.to_json(true, true);
    filter.iter().all(|f| f.matches(&view))
}

impl DocumentStore for InMemoryStore {
    fn find_one(&self, query: StoreQuery) -> BoxFuture<'_, StoreResult<Option<StoredDocument>>> {
        Box::pin(async move {
            let state = self.state.read().await;
            let (found, fields) = match &query.target {
                QueryTarget::Global { global_type } => {
                    let fields = self
                        .catalog
                        .global(global_type)
                        .map(|g| g.fields.as_slice())
                        .ok_or_else(|| StoreError::UnknownSchema(global_type.clone()))?;
                    (state.globals.get(global_type), fields)
                }
                QueryTarget::ById { collection, id } => {
                    let fields = self.collection_fields(collection)?;
                    let found = state
                        .collections
                        .get(collection)
                        .and_then(|docs| docs.iter().find(|d| &d.id == id));
                    (found, fields)
                }
                QueryTarget::Collection { collection, filter } => {
                    let fields = self.collection_fields(collection)?;
                    let found = state
                        .collections
                        .get(collection)
                        .and_then(|docs| docs.iter().find(|d| matches_all(d, filter)));
                    (found, fields)
                }
            };

            Ok(found.map(|doc| self.hydrate(&state, doc, fields, query.options.autopopulate)))
        })
    }

    fn find(&self, query: FindQuery) -> BoxFuture<'_, StoreResult<FindResult>> {
        Box::pin(async move {
            let fields = self.collection_fields(&query.collection)?;
            let state = self.state.read().await;

            let mut matched: Vec<(Value, &StoredDocument)> = state
                .collections
                .get(&query.collection)
                .into_iter()
                .flatten()
                .filter(|d| matches_all(d, &query.filter))
                .map(|d| (d.to_json(true, true), d))
                .collect();

            sort_by_specs(&mut matched, &query.sort, |(view, _)| view);

            let total_docs = matched.len();
            let take = if query.limit == 0 {
                usize::MAX
            } else {
                query.limit
            };
            let docs = matched
                .into_iter()
                .skip(query.skip)
                .take(take)
                .map(|(_, d)| self.hydrate(&state, d, fields, query.options.autopopulate))
                .collect();

            Ok(FindResult { docs, total_docs })
        })
    }

    fn create<'a>(
        &'a self,
        collection: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>> {
        Box::pin(async move {
            self.collection_fields(collection)?;
            let doc = StoredDocument::new(Uuid::new_v4().simple().to_string(), data);

            let mut state = self.state.write().await;
            state
                .collections
                .entry(collection.to_string())
                .or_default()
                .push(doc.clone());
            Ok(doc)
        })
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>> {
        Box::pin(async move {
            self.collection_fields(collection)?;
            let mut state = self.state.write().await;

            let Some(doc) = state
                .collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            else {
                return Ok(None);
            };

            doc.data = data;
            doc.updated_at = Utc::now();
            Ok(Some(doc.clone()))
        })
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>> {
        Box::pin(async move {
            self.collection_fields(collection)?;
            let mut state = self.state.write().await;

            let Some(docs) = state.collections.get_mut(collection) else {
                return Ok(None);
            };
            Ok(docs
                .iter()
                .position(|d| d.id == id)
                .map(|pos| docs.remove(pos)))
        })
    }

    fn upsert_global<'a>(
        &'a self,
        global_type: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>> {
        Box::pin(async move {
            if self.catalog.global(global_type).is_none() {
                return Err(StoreError::UnknownSchema(global_type.to_string()));
            }

            let mut state = self.state.write().await;
            let doc = match state.globals.get_mut(global_type) {
                Some(existing) => {
                    existing.data = data;
                    existing.updated_at = Utc::now();
                    existing.clone()
                }
                None => {
                    let doc = StoredDocument::new(Uuid::new_v4().simple().to_string(), data)
                        .with_global_type(global_type);
                    state.globals.insert(global_type.to_string(), doc.clone());
                    doc
                }
            };
            Ok(doc)
        })
    }
}
