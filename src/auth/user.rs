//! # User Principal
//!
//! The authenticated caller as seen by policies and hooks. Users are
//! ordinary documents in an auth-enabled collection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Document id within its collection
    pub id: String,

    /// Login email
    pub email: String,

    /// Auth-enabled collection the user lives in
    pub collection: String,

    /// Role names read from the document's `roles` field
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            collection: collection.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Build a principal from a serialized user document
    ///
    /// Returns `None` when the document lacks an id or email.
    pub fn from_document(collection: &str, doc: &Value) -> Option<Self> {
        let id = doc.get("id").or_else(|| doc.get("_id"))?.as_str()?;
        let email = doc.get("email")?.as_str()?;

        let roles = match doc.get("roles") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(role)) => vec![role.clone()],
            _ => Vec::new(),
        };

        Some(Self {
            id: id.to_string(),
            email: email.to_string(),
            collection: collection.to_string(),
            roles,
        })
    }
}
