//! Store query types

use crate::core::context::Api;

use super::document::StoredDocument;
use super::filter::FilterExpr;
use super::sort::SortSpec;

/// How relationship fields are populated on the way out of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Autopopulate {
    /// Whatever the store is configured to do
    StoreDefault,
    /// Leave relationship ids as stored
    Disabled,
    /// Replace ids with documents, this many levels deep
    MaxDepth(u32),
}

impl Autopopulate {
    /// Population mode for a request
    ///
    /// Only REST requests control population; every other surface gets
    /// the store default regardless of `depth`.
    pub fn for_request(api: Api, depth: Option<u32>) -> Self {
        match (api, depth) {
            (Api::Rest, Some(d)) if d > 0 => Autopopulate::MaxDepth(d),
            (Api::Rest, _) => Autopopulate::Disabled,
            _ => Autopopulate::StoreDefault,
        }
    }

    /// Concrete depth given the store's default
    pub fn depth(self, store_default: u32) -> u32 {
        match self {
            Autopopulate::StoreDefault => store_default,
            Autopopulate::Disabled => 0,
            Autopopulate::MaxDepth(d) => d,
        }
    }
}

/// Options shared by all reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub autopopulate: Autopopulate,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            autopopulate: Autopopulate::StoreDefault,
        }
    }
}

/// What a single-document lookup is keyed on
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTarget {
    /// The singleton whose `global_type` equals the slug
    Global { global_type: String },
    /// First document in the collection matching every filter
    Collection {
        collection: String,
        filter: Vec<FilterExpr>,
    },
    /// Document by id
    ById { collection: String, id: String },
}

/// Single-document lookup
#[derive(Debug, Clone, PartialEq)]
pub struct StoreQuery {
    pub target: QueryTarget,
    pub options: QueryOptions,
}

impl StoreQuery {
    pub fn global(global_type: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::Global {
                global_type: global_type.into(),
            },
            options: QueryOptions::default(),
        }
    }

    pub fn by_id(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            target: QueryTarget::ById {
                collection: collection.into(),
                id: id.into(),
            },
            options: QueryOptions::default(),
        }
    }

    pub fn matching(collection: impl Into<String>, filter: Vec<FilterExpr>) -> Self {
        Self {
            target: QueryTarget::Collection {
                collection: collection.into(),
                filter,
            },
            options: QueryOptions::default(),
        }
    }

    pub fn with_autopopulate(mut self, autopopulate: Autopopulate) -> Self {
        self.options.autopopulate = autopopulate;
        self
    }
}

/// Multi-document query
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    pub collection: String,
    pub filter: Vec<FilterExpr>,
    pub sort: Vec<SortSpec>,
    /// Maximum documents to return; 0 means no limit
    pub limit: usize,
    pub skip: usize,
    pub options: QueryOptions,
}

impl FindQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: Vec::new(),
            sort: Vec::new(),
            limit: 0,
            skip: 0,
            options: QueryOptions::default(),
        }
    }
}

/// One page of documents plus the unpaginated match count
#[derive(Debug, Clone, Default)]
pub struct FindResult {
    pub docs: Vec<StoredDocument>,
    pub total_docs: usize,
}
