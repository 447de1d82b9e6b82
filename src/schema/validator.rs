//! Document validator
//!
//! Validation runs on the fully merged document, never on a partial
//! patch, and collects every failing field before returning.
//!
//! Rules:
//! - No undeclared fields (array rows may carry `id`; block rows may
//!   carry `id`, `blockType` and `blockName`)
//! - Required fields are present, non-null and not an empty string
//! - Values match their field type; `null` clears an optional field
//! - Number bounds, select options and array row counts are enforced
//!
//! The validator does not mutate documents. Defaults and hidden-field
//! stripping are separate helpers below.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use super::errors::{FieldError, ValidationError, ValidationResult};
use super::types::{Block, Field, FieldType};

const ARRAY_ROW_KEYS: &[&str] = &["id"];
const BLOCK_ROW_KEYS: &[&str] = &["id", "blockType", "blockName"];

/// Validates documents against a field list.
pub struct DocumentValidator<'a> {
    fields: &'a [Field],
}

impl<'a> DocumentValidator<'a> {
    pub fn new(fields: &'a [Field]) -> Self {
        Self { fields }
    }

    /// Validates a whole document.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` listing every invalid field.
    pub fn validate(&self, document: &Value) -> ValidationResult<()> {
        let mut errors = Vec::new();

        match document.as_object() {
            Some(obj) => validate_object(obj, self.fields, "", &[], &mut errors),
            None => errors.push(FieldError::type_mismatch(
                "$root",
                "object",
                json_type_name(document),
            )),
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

fn validate_object(
    obj: &Map<String, Value>,
    fields: &[Field],
    path_prefix: &str,
    allowed_extra: &[&str],
    errors: &mut Vec<FieldError>,
) {
    for key in obj.keys() {
        let declared = fields.iter().any(|f| &f.name == key);
        if !declared && !allowed_extra.contains(&key.as_str()) {
            errors.push(FieldError::unknown(make_path(path_prefix, key)));
        }
    }

    for field in fields {
        let path = make_path(path_prefix, &field.name);
        match obj.get(&field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    errors.push(FieldError::required(path));
                }
            }
            Some(Value::String(s)) if s.is_empty() && field.required => {
                errors.push(FieldError::required(path));
            }
            Some(value) => validate_value(value, field, &path, errors),
        }
    }
}

fn validate_value(value: &Value, field: &Field, path: &str, errors: &mut Vec<FieldError>) {
    match &field.field_type {
        FieldType::Text | FieldType::Textarea => {
            if !value.is_string() {
                errors.push(type_error(path, "string", value));
            }
        }
        FieldType::Email => match value.as_str() {
            Some(s) if s.is_empty() || looks_like_email(s) => {}
            Some(_) => errors.push(FieldError::new(path, "Invalid email address")),
            None => errors.push(type_error(path, "string", value)),
        },
        FieldType::Number { min, max } => match value.as_f64() {
            Some(n) => {
                if let Some(min) = min {
                    if n < *min {
                        errors.push(FieldError::new(
                            path,
                            format!("Value must be greater than or equal to {}", min),
                        ));
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        errors.push(FieldError::new(
                            path,
                            format!("Value must be less than or equal to {}", max),
                        ));
                    }
                }
            }
            None => errors.push(type_error(path, "number", value)),
        },
        FieldType::Checkbox => {
            if !value.is_boolean() {
                errors.push(type_error(path, "boolean", value));
            }
        }
        FieldType::Date => match value.as_str() {
            Some(s) if is_date(s) => {}
            Some(_) => errors.push(FieldError::new(path, "Invalid date")),
            None => errors.push(type_error(path, "date string", value)),
        },
        FieldType::Select { options, has_many } => {
            validate_select(value, options, *has_many, path, errors)
        }
        FieldType::Relationship { has_many, .. } => {
            validate_relationship(value, *has_many, path, errors)
        }
        FieldType::Group { fields } => match value.as_object() {
            Some(obj) => validate_object(obj, fields, path, &[], errors),
            None => errors.push(type_error(path, "object", value)),
        },
        FieldType::Array {
            fields,
            min_rows,
            max_rows,
        } => {
            let Some(rows) = value.as_array() else {
                errors.push(type_error(path, "array", value));
                return;
            };
            if let Some(min) = min_rows {
                if rows.len() < *min {
                    errors.push(FieldError::new(
                        path,
                        format!("This field requires at least {} row(s)", min),
                    ));
                }
            }
            if let Some(max) = max_rows {
                if rows.len() > *max {
                    errors.push(FieldError::new(
                        path,
                        format!("This field allows at most {} row(s)", max),
                    ));
                }
            }
            for (i, row) in rows.iter().enumerate() {
                let row_path = format!("{}.{}", path, i);
                match row.as_object() {
                    Some(obj) => validate_object(obj, fields, &row_path, ARRAY_ROW_KEYS, errors),
                    None => errors.push(type_error(&row_path, "object", row)),
                }
            }
        }
        FieldType::Blocks { blocks } => {
            let Some(rows) = value.as_array() else {
                errors.push(type_error(path, "array", value));
                return;
            };
            for (i, row) in rows.iter().enumerate() {
                let row_path = format!("{}.{}", path, i);
                validate_block_row(row, blocks, &row_path, errors);
            }
        }
        FieldType::RichText => {}
    }
}

fn validate_block_row(row: &Value, blocks: &[Block], path: &str, errors: &mut Vec<FieldError>) {
    let Some(obj) = row.as_object() else {
        errors.push(type_error(path, "object", row));
        return;
    };

    let block_type = obj.get("blockType").and_then(Value::as_str);
    match block_type.and_then(|t| blocks.iter().find(|b| b.slug == t)) {
        Some(block) => validate_object(obj, &block.fields, path, BLOCK_ROW_KEYS, errors),
        None => errors.push(FieldError::new(
            make_path(path, "blockType"),
            format!("Unknown block type: {}", block_type.unwrap_or("<missing>")),
        )),
    }
}

fn validate_select(
    value: &Value,
    options: &[String],
    has_many: bool,
    path: &str,
    errors: &mut Vec<FieldError>,
) {
    let check = |v: &Value, errors: &mut Vec<FieldError>| match v.as_str() {
        Some(s) if options.iter().any(|o| o == s) => {}
        Some(s) => errors.push(FieldError::new(
            path,
            format!("'{}' is not a valid option", s),
        )),
        None => errors.push(type_error(path, "string", v)),
    };

    if has_many {
        match value.as_array() {
            Some(items) => items.iter().for_each(|v| check(v, errors)),
            None => errors.push(type_error(path, "array", value)),
        }
    } else {
        check(value, errors);
    }
}

fn validate_relationship(value: &Value, has_many: bool, path: &str, errors: &mut Vec<FieldError>) {
    if has_many {
        match value.as_array() {
            Some(items) => {
                if items.iter().any(|v| !v.is_string()) {
                    errors.push(FieldError::new(path, "Expected an array of document ids"));
                }
            }
            None => errors.push(type_error(path, "array", value)),
        }
    } else if !value.is_string() {
        errors.push(type_error(path, "document id", value));
    }
}

/// Insert `default_value` for absent fields, recursing into groups that are
/// present or that have defaulted children.
pub fn apply_defaults(fields: &[Field], data: &mut Map<String, Value>) {
    for field in fields {
        match data.get_mut(&field.name) {
            Some(Value::Object(nested)) => {
                if let FieldType::Group { fields } = &field.field_type {
                    apply_defaults(fields, nested);
                }
            }
            Some(_) => {}
            None => {
                if let Some(default) = &field.default_value {
                    data.insert(field.name.clone(), default.clone());
                } else if let FieldType::Group { fields } = &field.field_type {
                    let mut nested = Map::new();
                    apply_defaults(fields, &mut nested);
                    if !nested.is_empty() {
                        data.insert(field.name.clone(), Value::Object(nested));
                    }
                }
            }
        }
    }
}

/// Remove hidden fields at every nesting level.
pub fn strip_hidden(fields: &[Field], data: &mut Map<String, Value>) {
    for field in fields {
        if field.hidden {
            data.remove(&field.name);
            continue;
        }
        let Some(value) = data.get_mut(&field.name) else {
            continue;
        };
        match &field.field_type {
            FieldType::Group { fields } => {
                if let Some(obj) = value.as_object_mut() {
                    strip_hidden(fields, obj);
                }
            }
            FieldType::Array { fields, .. } => {
                for row in value.as_array_mut().into_iter().flatten() {
                    if let Some(obj) = row.as_object_mut() {
                        strip_hidden(fields, obj);
                    }
                }
            }
            FieldType::Blocks { blocks } => {
                for row in value.as_array_mut().into_iter().flatten() {
                    let Some(obj) = row.as_object_mut() else {
                        continue;
                    };
                    let slug = obj.get("blockType").and_then(Value::as_str).map(str::to_string);
                    if let Some(block) = slug.and_then(|s| blocks.iter().find(|b| b.slug == s)) {
                        strip_hidden(&block.fields, obj);
                    }
                }
            }
            _ => {}
        }
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !s.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
            .unwrap_or(false)
}

fn is_date(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Returns the JSON type name for error messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Creates a field path from prefix and field name.
fn make_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn type_error(path: &str, expected: &str, actual: &Value) -> FieldError {
    FieldError::type_mismatch(path, expected, json_type_name(actual))
}
