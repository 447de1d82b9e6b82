//! Schema type definitions
//!
//! Collections and globals are described by a list of fields. Field JSON
//! looks like `{"name": "title", "type": "text", "required": true}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::AccessConfig;

/// Keys the pipeline owns; documents may not declare fields with these names
pub const RESERVED_KEYS: &[&str] = &["id", "_id", "createdAt", "updatedAt", "globalType"];

/// Supported field types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    /// Single-line string
    Text,
    /// Multi-line string
    Textarea,
    /// String holding an email address
    Email,
    /// Number with optional bounds
    Number {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Boolean
    Checkbox,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    Date,
    /// One (or many) of a fixed set of strings
    Select {
        options: Vec<String>,
        #[serde(default)]
        has_many: bool,
    },
    /// Reference(s) to documents of another collection, stored as ids
    Relationship {
        relation_to: String,
        #[serde(default)]
        has_many: bool,
    },
    /// Nested object
    Group { fields: Vec<Field> },
    /// Repeated rows sharing one field set
    Array {
        fields: Vec<Field>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_rows: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_rows: Option<usize>,
    },
    /// Flexible content: rows pick a block layout via `blockType`
    Blocks { blocks: Vec<Block> },
    /// Opaque rich-text JSON
    RichText,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Email => "email",
            FieldType::Number { .. } => "number",
            FieldType::Checkbox => "checkbox",
            FieldType::Date => "date",
            FieldType::Select { .. } => "select",
            FieldType::Relationship { .. } => "relationship",
            FieldType::Group { .. } => "group",
            FieldType::Array { .. } => "array",
            FieldType::Blocks { .. } => "blocks",
            FieldType::RichText => "rich_text",
        }
    }
}

/// A block layout available to a `blocks` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub slug: String,
    pub fields: Vec<Field>,
}

impl Block {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            slug: slug.into(),
            fields,
        }
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(flatten)]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Stored per locale as `{ "<locale>": value }`
    #[serde(default)]
    pub localized: bool,

    /// Never serialized to callers
    #[serde(default)]
    pub hidden: bool,

    /// Applied on create when the field is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            localized: false,
            hidden: false,
            default_value: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn email(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Email)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number { min: None, max: None })
    }

    pub fn checkbox(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Checkbox)
    }

    pub fn relationship(name: impl Into<String>, relation_to: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::Relationship {
                relation_to: relation_to.into(),
                has_many: false,
            },
        )
    }

    pub fn relationship_many(name: impl Into<String>, relation_to: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldType::Relationship {
                relation_to: relation_to.into(),
                has_many: true,
            },
        )
    }

    pub fn group(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(name, FieldType::Group { fields })
    }

    pub fn array(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(
            name,
            FieldType::Array {
                fields,
                min_rows: None,
                max_rows: None,
            },
        )
    }

    pub fn blocks(name: impl Into<String>, blocks: Vec<Block>) -> Self {
        Self::new(name, FieldType::Blocks { blocks })
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn localized(mut self) -> Self {
        self.localized = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Whether this field or anything nested under it is localized
    pub fn has_localized(&self) -> bool {
        if self.localized {
            return true;
        }
        match &self.field_type {
            FieldType::Group { fields } | FieldType::Array { fields, .. } => {
                has_localized_fields(fields)
            }
            FieldType::Blocks { blocks } => blocks.iter().any(|b| has_localized_fields(&b.fields)),
            _ => false,
        }
    }
}

/// Whether any field in the list is localized, at any depth
pub fn has_localized_fields(fields: &[Field]) -> bool {
    fields.iter().any(Field::has_localized)
}

/// Look up a field by name
pub fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

fn default_true() -> bool {
    true
}

/// Collection definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub slug: String,

    pub fields: Vec<Field>,

    /// Maintain `createdAt` / `updatedAt`
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Field the admin UI uses as the document title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_as_title: Option<String>,

    /// Documents are login-capable users
    #[serde(default)]
    pub auth: bool,

    #[serde(default)]
    pub access: AccessConfig,
}

impl CollectionSchema {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            slug: slug.into(),
            fields,
            timestamps: true,
            use_as_title: None,
            auth: false,
            access: AccessConfig::default(),
        }
    }

    pub fn with_auth(mut self) -> Self {
        self.auth = true;
        self
    }

    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn with_access(mut self, access: AccessConfig) -> Self {
        self.access = access;
        self
    }

    /// Add the implicit `email` and `hash` fields to auth collections
    pub(crate) fn normalize(mut self) -> Self {
        if self.auth {
            if find_field(&self.fields, "email").is_none() {
                self.fields.insert(0, Field::email("email").required());
            }
            if find_field(&self.fields, "hash").is_none() {
                self.fields.push(Field::text("hash").hidden());
            }
        }
        self
    }

    pub fn has_localized_fields(&self) -> bool {
        has_localized_fields(&self.fields)
    }
}

/// Global (singleton) definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSchema {
    pub slug: String,

    pub fields: Vec<Field>,

    #[serde(default)]
    pub access: AccessConfig,
}

impl GlobalSchema {
    pub fn new(slug: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            slug: slug.into(),
            fields,
            access: AccessConfig::default(),
        }
    }

    pub fn with_access(mut self, access: AccessConfig) -> Self {
        self.access = access;
        self
    }

    pub fn has_localized_fields(&self) -> bool {
        has_localized_fields(&self.fields)
    }
}
