//! Delete a collection document

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::{CmsError, CmsResult};
use crate::hooks::{run_after_hook, run_before_hook};
use crate::operations::{autopopulate, read_document, read_selection, OperationContext};
use crate::store::StoreQuery;

/// Remove the document named by `args.id` and return it as it was
pub async fn delete(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let collection = ctx.registry.collection(&args.slug)?;

    execute_policy(args.user.as_ref(), collection.access.delete.as_ref()).await?;

    let args = run_before_hook(collection.hooks.before_delete.as_ref(), args).await?;

    let schema = &collection.schema;
    let id = args
        .require_id()
        .map_err(CmsError::invalid_request)?
        .to_string();
    let selection = read_selection(&ctx.registry, &args)?;

    let query = StoreQuery::by_id(schema.slug.clone(), id.clone())
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result = read_document(
        ctx,
        query,
        &schema.fields,
        schema.timestamps,
        selection.as_ref(),
    )
    .await?;

    ctx.store
        .delete(&schema.slug, &id)
        .await?
        .ok_or(CmsError::NotFound)?;
    tracing::debug!(collection = %schema.slug, id = %id, "document deleted");

    run_after_hook(collection.hooks.after_delete.as_ref(), args, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hooks;
    use crate::operations::collections::create;
    use crate::operations::test_support::{context, context_with, registry, LogCapture};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_returns_deleted_document() {
        let ctx = context();
        let saved = ctx
            .store
            .create("posts", json!({"title": {"en": "Bye"}}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let doc = delete(&ctx, OperationArgs::new("posts").with_id(&saved.id))
            .await
            .unwrap();
        assert_eq!(doc["id"], json!(saved.id));
        assert_eq!(doc["title"], "Bye");

        let again = delete(&ctx, OperationArgs::new("posts").with_id(&saved.id)).await;
        assert!(matches!(again, Err(CmsError::NotFound)));
    }

    #[tokio::test]
    async fn test_not_found_skips_after_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let hooks = Hooks::new().after_delete(move |_args: OperationArgs, doc: Value| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, CmsError>(doc)
            }
        });
        let ctx = context_with(registry().with_collection_hooks("posts", hooks).unwrap());

        let result = delete(&ctx, OperationArgs::new("posts").with_id("missing")).await;
        assert!(matches!(result, Err(CmsError::NotFound)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_delete_denied_keeps_document() {
        let ctx = context();
        let saved = ctx
            .store
            .create("locked", json!({"name": "a"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let result = delete(&ctx, OperationArgs::new("locked").with_id(&saved.id)).await;
        assert!(matches!(result, Err(CmsError::Forbidden)));
        assert!(ctx
            .store
            .find_one(StoreQuery::by_id("locked", saved.id.clone()))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_each_write_logs_once() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let ctx = context();
        let doc = create(
            &ctx,
            OperationArgs::new("posts").with_data(json!({"title": "Hello"})),
        )
        .await
        .unwrap();
        delete(
            &ctx,
            OperationArgs::new("posts").with_id(doc["id"].as_str().unwrap()),
        )
        .await
        .unwrap();

        assert_eq!(logs.occurrences("document created"), 1);
        assert_eq!(logs.occurrences("document deleted"), 1);
    }
}
