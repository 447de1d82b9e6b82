//! Update a collection document

use serde_json::Value;

use crate::access::execute_policy;
use crate::core::context::OperationArgs;
use crate::core::error::{CmsError, CmsResult};
use crate::hooks::{run_after_hook, run_before_hook};
use crate::locale::merge_fields;
use crate::operations::collections::{ensure_unique_email, prepare_auth_fields};
use crate::operations::{
    autopopulate, incoming_data, read_document, read_selection, validate_write, write_locale,
    OperationContext,
};
use crate::store::{Autopopulate, StoreQuery};

/// Merge `args.data` into the document named by `args.id`
///
/// Fields absent from the payload keep their stored values; the merged
/// document must still validate as a whole.
pub async fn update(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let collection = ctx.registry.collection(&args.slug)?;

    execute_policy(args.user.as_ref(), collection.access.update.as_ref()).await?;

    let args = run_before_hook(collection.hooks.before_update.as_ref(), args).await?;

    let schema = &collection.schema;
    let id = args
        .require_id()
        .map_err(CmsError::invalid_request)?
        .to_string();
    let locale = write_locale(&ctx.registry, &args)?;
    let selection = read_selection(&ctx.registry, &args)?;
    let mut incoming = incoming_data(&args)?;
    if schema.auth {
        prepare_auth_fields(&mut incoming, false)?;
    }

    let stored = StoreQuery::by_id(schema.slug.clone(), id.clone())
        .with_autopopulate(Autopopulate::Disabled);
    let existing = ctx
        .store
        .find_one(stored)
        .await?
        .ok_or(CmsError::NotFound)?;

    let merged = merge_fields(&schema.fields, &incoming, Some(&existing.data), locale.as_deref());
    validate_write(&ctx.registry, &schema.fields, &merged, locale.as_deref())?;
    if schema.auth {
        ensure_unique_email(ctx, &schema.slug, &merged, Some(&id)).await?;
    }

    ctx.store
        .update(&schema.slug, &id, merged)
        .await?
        .ok_or(CmsError::NotFound)?;
    tracing::debug!(collection = %schema.slug, id = %id, "document updated");

    let query = StoreQuery::by_id(schema.slug.clone(), id)
        .with_autopopulate(autopopulate(&ctx.registry, &args));
    let result = read_document(
        ctx,
        query,
        &schema.fields,
        schema.timestamps,
        selection.as_ref(),
    )
    .await?;

    run_after_hook(collection.hooks.after_update.as_ref(), args, result).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::crypto::verify_password;
    use crate::auth::User;
    use crate::hooks::Hooks;
    use crate::operations::collections::create;
    use crate::operations::test_support::{context, context_with, registry};
    use serde_json::json;

    async fn seed_post(ctx: &OperationContext) -> String {
        let doc = create(
            ctx,
            OperationArgs::new("posts").with_data(json!({"title": "Hello", "views": 1})),
        )
        .await
        .unwrap();
        doc["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let ctx = context();
        let id = seed_post(&ctx).await;

        let doc = update(
            &ctx,
            OperationArgs::new("posts")
                .with_id(&id)
                .with_data(json!({"views": 2})),
        )
        .await
        .unwrap();
        assert_eq!(doc["views"], 2);
        assert_eq!(doc["title"], "Hello");
        assert_eq!(doc["status"], "draft");
    }

    #[tokio::test]
    async fn test_translation_added_alongside_existing() {
        let ctx = context();
        let id = seed_post(&ctx).await;

        update(
            &ctx,
            OperationArgs::new("posts")
                .with_id(&id)
                .with_locale("es")
                .with_data(json!({"title": "Hola"})),
        )
        .await
        .unwrap();

        let stored = ctx
            .store
            .find_one(StoreQuery::by_id("posts", id.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data["title"], json!({"en": "Hello", "es": "Hola"}));
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let result = update(
            &context(),
            OperationArgs::new("posts")
                .with_id("missing")
                .with_data(json!({"views": 2})),
        )
        .await;
        assert!(matches!(result, Err(CmsError::NotFound)));
    }

    #[tokio::test]
    async fn test_merged_document_must_validate() {
        let ctx = context();
        let id = seed_post(&ctx).await;

        let result = update(
            &ctx,
            OperationArgs::new("posts")
                .with_id(&id)
                .with_data(json!({"title": null})),
        )
        .await;
        assert!(matches!(result, Err(CmsError::Validation(ref v)) if v.has_path("title")));
    }

    #[tokio::test]
    async fn test_role_policy() {
        let ctx = context();
        let saved = ctx
            .store
            .create("locked", json!({"name": "a"}).as_object().cloned().unwrap())
            .await
            .unwrap();

        let editor = User::new("u1", "e@b.co", "users").with_roles(["editor"]);
        let denied = update(
            &ctx,
            OperationArgs::new("locked")
                .with_id(&saved.id)
                .with_user(editor)
                .with_data(json!({"name": "b"})),
        )
        .await;
        assert!(matches!(denied, Err(CmsError::Forbidden)));

        let admin = User::new("u2", "a@b.co", "users").with_roles(["admin"]);
        let allowed = update(
            &ctx,
            OperationArgs::new("locked")
                .with_id(&saved.id)
                .with_user(admin)
                .with_data(json!({"name": "b"})),
        )
        .await
        .unwrap();
        assert_eq!(allowed["name"], "b");
    }

    #[tokio::test]
    async fn test_password_change_rehashes() {
        let ctx = context();
        let user = create(
            &ctx,
            OperationArgs::new("users").with_data(json!({
                "email": "a@b.co",
                "password": "first password"
            })),
        )
        .await
        .unwrap();
        let id = user["id"].as_str().unwrap().to_string();

        update(
            &ctx,
            OperationArgs::new("users")
                .with_id(&id)
                .with_data(json!({"password": "second password"})),
        )
        .await
        .unwrap();

        let stored = ctx
            .store
            .find_one(StoreQuery::by_id("users", id))
            .await
            .unwrap()
            .unwrap();
        let hash = stored.data["hash"].as_str().unwrap();
        assert!(verify_password("second password", hash).unwrap());
        assert_eq!(stored.data["email"], "a@b.co");
    }

    #[tokio::test]
    async fn test_after_update_hook_sees_updated_doc() {
        let hooks = Hooks::new().after_update(|args: OperationArgs, doc: Value| async move {
            assert_eq!(doc["id"].as_str(), args.id.as_deref());
            Ok::<_, CmsError>(doc)
        });
        let ctx = context_with(registry().with_collection_hooks("posts", hooks).unwrap());
        let id = seed_post(&ctx).await;

        let doc = update(
            &ctx,
            OperationArgs::new("posts")
                .with_id(&id)
                .with_data(json!({"views": 9})),
        )
        .await
        .unwrap();
        assert_eq!(doc["views"], 9);
    }
}
