//! Operation Arguments
//!
//! The per-request options carried through the pipeline. Before-hooks
//! receive and return this structure, so everything the store stage reads
//! comes from here rather than from the raw request.

use serde_json::Value;

use crate::auth::User;
use crate::store::{FilterExpr, SortSpec};

/// Which surface issued the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Api {
    /// HTTP REST handlers
    Rest,
    /// Structured query API; relation shape is fixed by its resolvers
    GraphQl,
    /// In-process calls
    #[default]
    Local,
}

impl Api {
    pub fn as_str(&self) -> &'static str {
        match self {
            Api::Rest => "REST",
            Api::GraphQl => "GraphQL",
            Api::Local => "local",
        }
    }
}

/// Options for a single operation call
#[derive(Debug, Clone, Default)]
pub struct OperationArgs {
    /// Collection or global slug
    pub slug: String,

    /// Authenticated principal, if any
    pub user: Option<User>,

    /// Requested locale ("all" returns every translation)
    pub locale: Option<String>,

    /// Locale to use when a translation is missing ("none" disables)
    pub fallback_locale: Option<String>,

    /// Relationship population depth (REST only)
    pub depth: Option<u32>,

    /// Originating surface
    pub api: Api,

    /// Target document id
    pub id: Option<String>,

    /// Incoming document data for writes
    pub data: Option<Value>,

    /// Filters for `find`
    pub filter: Vec<FilterExpr>,

    /// Sort order for `find`
    pub sort: Vec<SortSpec>,

    /// Page size for `find`
    pub limit: Option<usize>,

    /// 1-based page number for `find`
    pub page: Option<usize>,
}

impl OperationArgs {
    /// Create args targeting a slug through the local API
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_fallback_locale(mut self, locale: impl Into<String>) -> Self {
        self.fallback_locale = Some(locale.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_api(mut self, api: Api) -> Self {
        self.api = api;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter.push(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Require the target id, for by-id operations
    pub fn require_id(&self) -> Result<&str, &'static str> {
        self.id.as_deref().ok_or("Missing document id")
    }
}
