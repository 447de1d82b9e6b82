//! Paginated collection query

use serde::Serialize;
use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;
use crate::hooks::{run_after_hook, run_before_hook};
use crate::locale::{localize_filters, localize_sort};
use crate::operations::{
    autopopulate, localize, read_selection, reject_hidden_paths, serialize, OperationContext,
    DEFAULT_LIMIT, MAX_LIMIT,
};
use crate::store::{FindQuery, QueryOptions};

/// One page of serialized documents
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedDocs {
    pub docs: Vec<Value>,
    pub total_docs: usize,
    pub limit: usize,
    pub total_pages: usize,
    pub page: usize,
    /// 1-based index of the first document on this page
    pub paging_counter: usize,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_page: Option<usize>,
    pub next_page: Option<usize>,
}

impl PaginatedDocs {
    fn new(docs: Vec<Value>, total_docs: usize, limit: usize, page: usize) -> Self {
        let total_pages = total_docs.div_ceil(limit).max(1);
        let has_prev_page = page > 1;
        let has_next_page = page < total_pages;
        Self {
            docs,
            total_docs,
            limit,
            total_pages,
            page,
            paging_counter: (page - 1) * limit + 1,
            has_prev_page,
            has_next_page,
            prev_page: has_prev_page.then(|| page - 1),
            next_page: has_next_page.then(|| page + 1),
        }
    }
}

/// Query a collection
///
/// Filters and sort keys on localized fields address the request locale
/// (the default locale when none or `all` is requested). The after-read
/// hook runs once per document.
pub async fn find(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let collection = ctx.registry.collection(&args.slug)?;

    execute_policy(args.user.as_ref(), collection.access.read.as_ref()).await?;

    let args = run_before_hook(collection.hooks.before_read.as_ref(), args).await?;

    let fields = &collection.schema.fields;
    reject_hidden_paths(fields, &args)?;
    let selection = read_selection(&ctx.registry, &args)?;
    let limit = args.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let page = args.page.unwrap_or(1).max(1);

    let (filter, sort) = match ctx.registry.localization() {
        Some(config) => {
            let locale = config.write_locale(args.locale.as_deref())?;
            (
                localize_filters(fields, args.filter.clone(), config, &locale),
                localize_sort(fields, args.sort.clone(), config, &locale),
            )
        }
        None => (args.filter.clone(), args.sort.clone()),
    };

    let query = FindQuery {
        collection: collection.schema.slug.clone(),
        filter,
        sort,
        limit,
        skip: (page - 1).saturating_mul(limit),
        options: QueryOptions {
            autopopulate: autopopulate(&ctx.registry, &args),
        },
    };
    let found = ctx.store.find(query).await?;

    let mut docs = Vec::with_capacity(found.docs.len());
    for mut doc in found.docs {
        localize(&ctx.registry, fields, &mut doc, selection.as_ref());
        let value = serialize(fields, collection.schema.timestamps, doc);
        docs.push(run_after_hook(collection.hooks.after_read.as_ref(), args.clone(), value).await?);
    }

    let result = PaginatedDocs::new(docs, found.total_docs, limit, page);
    Ok(serde_json::to_value(result)?)
}
