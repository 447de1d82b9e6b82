//! Collection lookup by id

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::{CmsError, CmsResult};
use crate::hooks::{run_after_hook, run_before_hook};
use crate::operations::{autopopulate, read_document, read_selection, OperationContext};
use crate::store::StoreQuery;

/// Fetch one document by `args.id`
pub async fn find_by_id(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let collection = ctx.registry.collection(&args.slug)?;

    execute_policy(args.user.as_ref(), collection.access.read.as_ref()).await?;

    let args = run_before_hook(collection.hooks.before_read.as_ref(), args).await?;

    let selection = read_selection(&ctx.registry, &args)?;
    let id = args.require_id().map_err(CmsError::invalid_request)?;
    let query = StoreQuery::by_id(collection.schema.slug.clone(), id)
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result = read_document(
        ctx,
        query,
        &collection.schema.fields,
        collection.schema.timestamps,
        selection.as_ref(),
    )
    .await?;

    run_after_hook(collection.hooks.after_read.as_ref(), args, result).await
}
