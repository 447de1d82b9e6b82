//! Auth operations
//!
//! Login, password reset and current-user lookups for auth-enabled
//! collections. These bypass collection policies: credentials (or a reset
//! token) are the access check.

use serde_json::{json, Map, Value};

use crate::auth::crypto::verify_password;
use crate::auth::{AuthError, EmailTemplate, JwtManager, User};
use crate::core::context::OperationArgs;
use crate::core::error::{CmsError, CmsResult};
use crate::operations::collections::prepare_auth_fields;
use crate::operations::{autopopulate, read_document, read_selection, OperationContext};
use crate::registry::CollectionConfig;
use crate::schema::CollectionSchema;
use crate::store::{Autopopulate, FilterExpr, StoreQuery, StoredDocument};

fn auth_collection<'a>(ctx: &'a OperationContext, slug: &str) -> CmsResult<&'a CollectionConfig> {
    let collection = ctx.registry.collection(slug)?;
    if !collection.schema.auth {
        return Err(AuthError::NotAuthCollection(slug.to_string()).into());
    }
    Ok(collection)
}

fn jwt(ctx: &OperationContext) -> CmsResult<&JwtManager> {
    Ok(ctx.registry.jwt().ok_or(AuthError::NotConfigured)?)
}

/// Exchange credentials for a signed token
///
/// Unknown emails and wrong passwords fail identically.
pub async fn login(
    ctx: &OperationContext,
    collection: &str,
    email: &str,
    password: &str,
) -> CmsResult<Value> {
    let config = auth_collection(ctx, collection)?;
    jwt(ctx)?;

    let Some(stored) = find_by_email(ctx, &config.schema, email).await? else {
        tracing::debug!(collection, "login for unknown email");
        return Err(AuthError::InvalidCredentials.into());
    };

    let hash = stored.data.get("hash").and_then(Value::as_str).unwrap_or_default();
    if hash.is_empty() || !verify_password(password, hash)? {
        tracing::debug!(collection, id = %stored.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let mut session = issue_session(ctx, &config.schema, &stored.id).await?;
    tracing::info!(collection, user = %stored.id, "user logged in");
    session["message"] = json!("Authentication successful");
    Ok(session)
}

/// Mail a one-time reset token to the owner of `email`
///
/// The response is the same whether or not the email is registered.
pub async fn forgot_password(
    ctx: &OperationContext,
    collection: &str,
    email: &str,
) -> CmsResult<Value> {
    let config = auth_collection(ctx, collection)?;

    match find_by_email(ctx, &config.schema, email).await? {
        Some(stored) => {
            let token = ctx.reset_tokens.issue(&config.schema.slug, &stored.id).await;
            let email = stored
                .data
                .get("email")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            ctx.mailer.send(EmailTemplate::PasswordReset {
                collection: config.schema.slug.clone(),
                email,
                token,
            })?;
            tracing::info!(collection, user = %stored.id, "password reset requested");
        }
        None => tracing::debug!(collection, "password reset for unknown email"),
    }

    Ok(json!({ "message": "Success" }))
}

/// Redeem a reset token, store the new password and log the user in
///
/// The password is checked before the token is spent, so a rejected
/// password leaves the token usable.
pub async fn reset_password(
    ctx: &OperationContext,
    collection: &str,
    token: &str,
    password: &str,
) -> CmsResult<Value> {
    let config = auth_collection(ctx, collection)?;
    let schema = &config.schema;
    jwt(ctx)?;

    let mut credentials = Map::new();
    credentials.insert("password".to_string(), json!(password));
    prepare_auth_fields(&mut credentials, true)?;

    let claim = ctx
        .reset_tokens
        .consume(token)
        .await
        .filter(|c| c.collection == schema.slug)
        .ok_or(AuthError::InvalidResetToken)?;

    let query = StoreQuery::by_id(schema.slug.clone(), claim.user_id.clone())
        .with_autopopulate(Autopopulate::Disabled);
    let mut stored = ctx
        .store
        .find_one(query)
        .await?
        .ok_or(AuthError::InvalidResetToken)?;
    stored.data.extend(credentials);
    let stored = ctx
        .store
        .update(&schema.slug, &claim.user_id, stored.data)
        .await?
        .ok_or(AuthError::InvalidResetToken)?;

    if let Some(email) = stored.data.get("email").and_then(Value::as_str) {
        let notice = EmailTemplate::PasswordChanged {
            collection: schema.slug.clone(),
            email: email.to_string(),
        };
        if let Err(e) = ctx.mailer.send(notice) {
            tracing::warn!(
                collection,
                user = %stored.id,
                error = %e,
                "password change notice not sent"
            );
        }
    }

    let mut session = issue_session(ctx, schema, &stored.id).await?;
    tracing::info!(collection, user = %stored.id, "password reset");
    session["message"] = json!("Password reset successfully.");
    Ok(session)
}

/// Stored document whose normalized email matches
async fn find_by_email(
    ctx: &OperationContext,
    schema: &CollectionSchema,
    email: &str,
) -> CmsResult<Option<StoredDocument>> {
    let email = email.trim().to_lowercase();
    let filter = vec![FilterExpr::eq("email", json!(email))];
    let query =
        StoreQuery::matching(schema.slug.clone(), filter).with_autopopulate(Autopopulate::Disabled);
    Ok(ctx.store.find_one(query).await?)
}

/// Signed token plus the serialized user document
async fn issue_session(
    ctx: &OperationContext,
    schema: &CollectionSchema,
    id: &str,
) -> CmsResult<Value> {
    let selection = read_selection(&ctx.registry, &OperationArgs::new(&schema.slug))?;
    let user_doc = read_document(
        ctx,
        StoreQuery::by_id(schema.slug.clone(), id.to_string()),
        &schema.fields,
        schema.timestamps,
        selection.as_ref(),
    )
    .await?;
    let user = User::from_document(&schema.slug, &user_doc).ok_or(AuthError::UnknownUser)?;
    let issued = jwt(ctx)?.generate_token(&user)?;

    Ok(json!({
        "token": issued.token,
        "exp": issued.exp,
        "user": user_doc,
    }))
}

/// The caller's own document, or `null` when anonymous
///
/// A user authenticated against a different collection, or one whose
/// document has since been deleted, also yields `null`.
pub async fn me(ctx: &OperationContext, args: OperationArgs) -> CmsResult<Value> {
    let config = auth_collection(ctx, &args.slug)?;
    let schema = &config.schema;

    let user_doc = match &args.user {
        Some(user) if user.collection == schema.slug => {
            let selection = read_selection(&ctx.registry, &args)?;
            let query = StoreQuery::by_id(schema.slug.clone(), user.id.clone())
                .with_autopopulate(autopopulate(&ctx.registry, &args));
            match read_document(ctx, query, &schema.fields, schema.timestamps, selection.as_ref())
                .await
            {
                Ok(doc) => doc,
                Err(CmsError::NotFound) => Value::Null,
                Err(e) => return Err(e),
            }
        }
        _ => Value::Null,
    };

    Ok(json!({ "user": user_doc, "collection": schema.slug }))
}

/// Resolve a bearer token to the user it was issued for
///
/// # Errors
///
/// Token validation failures, or `UnknownUser` when the user document no
/// longer exists.
pub async fn resolve_token(ctx: &OperationContext, token: &str) -> CmsResult<User> {
    let claims = jwt(ctx)?.validate_token(token)?;
    let config = auth_collection(ctx, &claims.collection)?;

    let query = StoreQuery::by_id(config.schema.slug.clone(), claims.sub)
        .with_autopopulate(Autopopulate::Disabled);
    let stored = ctx
        .store
        .find_one(query)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    Ok(User::from_document(&config.schema.slug, &stored.to_json(true, false))
        .ok_or(AuthError::UnknownUser)?)
}
