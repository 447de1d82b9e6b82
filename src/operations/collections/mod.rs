//! Collection operations
//!
//! Auth-enabled collections get two extra write steps: the plaintext
//! `password` is hashed into the hidden `hash` field, and emails are kept
//! unique within the collection.

mod create;
mod delete;
mod find;
mod find_by_id;
mod update;

pub use create::create;
pub use delete::delete;
pub use find::find;
pub use find_by_id::find_by_id;
pub use update::update;

use serde_json::{json, Map, Value};

use crate::auth::crypto::hash_password;
use crate::auth::{AuthError, PasswordPolicy};
use crate::core::error::CmsResult;
use crate::operations::OperationContext;
use crate::schema::ValidationError;
use crate::store::{Autopopulate, FilterExpr, FilterOperator, StoreQuery};

const PASSWORD_FIELD: &str = "password";
const HASH_FIELD: &str = "hash";
const EMAIL_FIELD: &str = "email";

/// Turn a plaintext password into a stored hash and normalize the email
///
/// A client-supplied `hash` is always discarded. On create a password is
/// mandatory; on update it is optional and replaces the hash when given.
pub(crate) fn prepare_auth_fields(data: &mut Map<String, Value>, creating: bool) -> CmsResult<()> {
    data.remove(HASH_FIELD);

    if let Some(Value::String(email)) = data.get_mut(EMAIL_FIELD) {
        *email = email.trim().to_lowercase();
    }

    match data.remove(PASSWORD_FIELD) {
        Some(Value::String(password)) => {
            PasswordPolicy::default()
                .validate(&password)
                .map_err(|e| match e {
                    AuthError::WeakPassword(msg) => ValidationError::field(PASSWORD_FIELD, msg),
                    other => ValidationError::field(PASSWORD_FIELD, other.to_string()),
                })?;
            let hash = hash_password(&password)?;
            data.insert(HASH_FIELD.to_string(), json!(hash));
        }
        Some(_) => {
            return Err(ValidationError::field(PASSWORD_FIELD, "Password must be a string").into());
        }
        None if creating => {
            return Err(ValidationError::field(PASSWORD_FIELD, "This field is required").into());
        }
        None => {}
    }

    Ok(())
}

/// Reject an email already used by another document in the collection
pub(crate) async fn ensure_unique_email(
    ctx: &OperationContext,
    collection: &str,
    data: &Map<String, Value>,
    exclude_id: Option<&str>,
) -> CmsResult<()> {
    let Some(email) = data.get(EMAIL_FIELD).and_then(Value::as_str) else {
        return Ok(());
    };

    let mut filter = vec![FilterExpr::eq(EMAIL_FIELD, json!(email))];
    if let Some(id) = exclude_id {
        filter.push(FilterExpr::new("id", FilterOperator::Neq, json!(id)));
    }

    let query = StoreQuery::matching(collection, filter).with_autopopulate(Autopopulate::Disabled);
    if ctx.store.find_one(query).await?.is_some() {
        return Err(ValidationError::field(
            EMAIL_FIELD,
            "A user with the given email is already registered",
        )
        .into());
    }

    Ok(())
}
