//! Read a global singleton

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;
use crate::hooks::{run_after_hook, run_before_hook};
use crate::operations::{autopopulate, read_document, read_selection, OperationContext};
use crate::store::StoreQuery;

/// Fetch the global named by `args.slug`
///
/// # Errors
///
/// - `UnknownGlobal` if the slug is not configured
/// - `Forbidden` if the read policy denies
/// - `InvalidLocale` for an unconfigured locale
/// - `NotFound` if the global has never been saved
/// - anything raised by a hook, unchanged
pub async fn find_one(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let global = ctx.registry.global(&args.slug)?;

    execute_policy(args.user.as_ref(), global.access.read.as_ref()).await?;

    let args = run_before_hook(global.hooks.before_read.as_ref(), args).await?;

    let selection = read_selection(&ctx.registry, &args)?;
    let query = StoreQuery::global(global.schema.slug.clone())
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result =
        read_document(ctx, query, &global.schema.fields, true, selection.as_ref()).await?;

    run_after_hook(global.hooks.after_read.as_ref(), args, result).await
}
