//! Relationship population
//!
//! Replaces stored relationship ids with the referenced documents. Each
//! level of nesting consumes one unit of depth, so `depth = 1` embeds the
//! direct targets with their own relationships left as ids. Ids that no
//! longer resolve are kept as-is.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::schema::{strip_hidden, Field, FieldType, SchemaCatalog};

use super::document::StoredDocument;

/// Resolves ids against a snapshot of collection contents
pub(crate) struct Populator<'a> {
    catalog: &'a SchemaCatalog,
    collections: &'a HashMap<String, Vec<StoredDocument>>,
}

impl<'a> Populator<'a> {
    pub(crate) fn new(
        catalog: &'a SchemaCatalog,
        collections: &'a HashMap<String, Vec<StoredDocument>>,
    ) -> Self {
        Self {
            catalog,
            collections,
        }
    }

    /// Populate relationship fields of `data` in place
    pub(crate) fn populate(&self, fields: &[Field], data: &mut Map<String, Value>, depth: u32) {
        if depth == 0 {
            return;
        }
        for field in fields {
            if let Some(value) = data.get_mut(&field.name) {
                self.populate_field(field, value, depth);
            }
        }
    }

    fn populate_field(&self, field: &Field, value: &mut Value, depth: u32) {
        // Localized values are stored as { "<locale>": value }
        if field.localized {
            if let Value::Object(per_locale) = value {
                for v in per_locale.values_mut() {
                    self.populate_value(field, v, depth);
                }
            }
            return;
        }
        self.populate_value(field, value, depth);
    }

    fn populate_value(&self, field: &Field, value: &mut Value, depth: u32) {
        match &field.field_type {
            FieldType::Relationship { relation_to, .. } => match value {
                Value::String(id) => {
                    if let Some(doc) = self.resolve(relation_to, id, depth) {
                        *value = doc;
                    }
                }
                Value::Array(items) => {
                    for item in items.iter_mut() {
                        if let Some(doc) = item.as_str().and_then(|id| self.resolve(relation_to, id, depth)) {
                            *item = doc;
                        }
                    }
                }
                _ => {}
            },
            FieldType::Group { fields } => {
                if let Some(obj) = value.as_object_mut() {
                    self.populate(fields, obj, depth);
                }
            }
            FieldType::Array { fields, .. } => {
                for row in value.as_array_mut().into_iter().flatten() {
                    if let Some(obj) = row.as_object_mut() {
                        self.populate(fields, obj, depth);
                    }
                }
            }
            FieldType::Blocks { blocks } => {
                for row in value.as_array_mut().into_iter().flatten() {
                    let Some(obj) = row.as_object_mut() else {
                        continue;
                    };
                    let block = obj
                        .get("blockType")
                        .and_then(Value::as_str)
                        .and_then(|t| blocks.iter().find(|b| b.slug == t));
                    if let Some(block) = block {
                        self.populate(&block.fields, obj, depth);
                    }
                }
            }
            _ => {}
        }
    }

    /// Serialized target document, itself populated one level shallower
    fn resolve(&self, collection: &str, id: &str, depth: u32) -> Option<Value> {
        let schema = self.catalog.collection(collection)?;
        let target = self.collections.get(collection)?.iter().find(|d| d.id == id)?;

        let mut target = target.clone();
        self.populate(&schema.fields, &mut target.data, depth - 1);
        strip_hidden(&schema.fields, &mut target.data);

        Some(target.to_json(true, schema.timestamps))
    }
}
