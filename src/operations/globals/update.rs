//! Write a global singleton

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;
use crate::hooks::{run_after_hook, run_before_hook};
use crate::locale::merge_fields;
use crate::operations::{
    autopopulate, incoming_data, read_document, read_selection, validate_write, write_locale,
    OperationContext,
};
use crate::schema::apply_defaults;
use crate::store::{Autopopulate, StoreQuery};

/// Merge `args.data` into the global, creating it on first write
///
/// Only the fields present in the payload change. Localized values land
/// in the request locale and leave other translations untouched. Field
/// defaults are applied when the global does not exist yet.
pub async fn update(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let global = ctx.registry.global(&args.slug)?;

    execute_policy(args.user.as_ref(), global.access.update.as_ref()).await?;

    let args = run_before_hook(global.hooks.before_update.as_ref(), args).await?;

    let locale = write_locale(&ctx.registry, &args)?;
    let selection = read_selection(&ctx.registry, &args)?;
    let mut incoming = incoming_data(&args)?;
    let fields = &global.schema.fields;

    let existing = ctx
        .store
        .find_one(
            StoreQuery::global(global.schema.slug.clone())
                .with_autopopulate(Autopopulate::Disabled),
        )
        .await?;
    if existing.is_none() {
        apply_defaults(fields, &mut incoming);
    }

    let merged = merge_fields(
        fields,
        &incoming,
        existing.as_ref().map(|doc| &doc.data),
        locale.as_deref(),
    );
    validate_write(&ctx.registry, fields, &merged, locale.as_deref())?;

    let saved = ctx.store.upsert_global(&global.schema.slug, merged).await?;
    tracing::debug!(global = %global.schema.slug, id = %saved.id, "global saved");

    let query = StoreQuery::global(global.schema.slug.clone())
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result = read_document(ctx, query, fields, true, selection.as_ref()).await?;

    run_after_hook(global.hooks.after_update.as_ref(), args, result).await
}
