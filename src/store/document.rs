//! Stored document representation

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A document as held by the store
///
/// `data` holds schema fields only. Identity, timestamps and the global
/// discriminator live alongside it and are merged in by [`to_json`].
///
/// [`to_json`]: StoredDocument::to_json
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,

    /// Set for global singletons; equals the global's slug
    pub global_type: Option<String>,

    pub data: Map<String, Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// A fresh document stamped with the current time
    pub fn new(id: impl Into<String>, data: Map<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            global_type: None,
            data,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_global_type(mut self, global_type: impl Into<String>) -> Self {
        self.global_type = Some(global_type.into());
        self
    }

    /// Plain JSON shape handed to callers
    ///
    /// `virtuals` adds the computed `id` next to `_id`; `timestamps` adds
    /// `createdAt` / `updatedAt` in RFC 3339.
    pub fn to_json(&self, virtuals: bool, timestamps: bool) -> Value {
        let mut out = Map::with_capacity(self.data.len() + 5);
        out.insert("_id".to_string(), Value::String(self.id.clone()));
        if virtuals {
            out.insert("id".to_string(), Value::String(self.id.clone()));
        }
        if let Some(global_type) = &self.global_type {
            out.insert("globalType".to_string(), Value::String(global_type.clone()));
        }
        for (key, value) in &self.data {
            out.insert(key.clone(), value.clone());
        }
        if timestamps {
            out.insert(
                "createdAt".to_string(),
                Value::String(self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
            out.insert(
                "updatedAt".to_string(),
                Value::String(self.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        Value::Object(out)
    }
}
