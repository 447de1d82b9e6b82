//! Insert a collection document

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;
use crate::hooks::{run_after_hook, run_before_hook};
use crate::locale::merge_fields;
use crate::operations::collections::{ensure_unique_email, prepare_auth_fields};
use crate::operations::{
    autopopulate, incoming_data, read_document, read_selection, validate_write, write_locale,
    OperationContext,
};
use crate::schema::apply_defaults;
use crate::store::StoreQuery;

/// Create a document from `args.data`
///
/// Reserved keys (`id`, timestamps) are ignored, defaults fill absent
/// fields, and localized values are stored under the request locale.
pub async fn create(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let collection = ctx.registry.collection(&args.slug)?;

    execute_policy(args.user.as_ref(), collection.access.create.as_ref()).await?;

    let args = run_before_hook(collection.hooks.before_create.as_ref(), args).await?;

    let schema = &collection.schema;
    let locale = write_locale(&ctx.registry, &args)?;
    let selection = read_selection(&ctx.registry, &args)?;
    let mut incoming = incoming_data(&args)?;

    if schema.auth {
        prepare_auth_fields(&mut incoming, true)?;
    }
    apply_defaults(&schema.fields, &mut incoming);

    let data = merge_fields(&schema.fields, &incoming, None, locale.as_deref());
    validate_write(&ctx.registry, &schema.fields, &data, locale.as_deref())?;
    if schema.auth {
        ensure_unique_email(ctx, &schema.slug, &data, None).await?;
    }

    let created = ctx.store.create(&schema.slug, data).await?;
    tracing::debug!(collection = %schema.slug, id = %created.id, "document created");

    let query = StoreQuery::by_id(schema.slug.clone(), created.id)
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result = read_document(
        ctx,
        query,
        &schema.fields,
        schema.timestamps,
        selection.as_ref(),
    )
    .await?;

    run_after_hook(collection.hooks.after_create.as_ref(), args, result).await
}
