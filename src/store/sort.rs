//! Result sorting
//!
//! Stable, deterministic ordering of documents by one or more fields.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::lookup_path;

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Dotted field path
    pub field: String,
    pub ascending: bool,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Sort values by the given keys; earlier keys take precedence.
///
/// `key` extracts the JSON view each spec is evaluated against.
pub fn sort_by_specs<T, F>(items: &mut [T], specs: &[SortSpec], key: F)
where
    F: Fn(&T) -> &Value,
{
    if specs.is_empty() {
        return;
    }

    items.sort_by(|a, b| {
        let (a, b) = (key(a), key(b));
        specs
            .iter()
            .map(|spec| {
                let ordering = compare_values(lookup_path(a, &spec.field), lookup_path(b, &spec.field));
                if spec.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

/// Compares two JSON values for sorting.
///
/// Ordering rules:
/// - missing < null < bool < number < string
/// - For same types, natural ordering
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a_val), Some(b_val)) => {
            let type_order = |v: &Value| -> u8 {
                match v {
                    Value::Null => 0,
                    Value::Bool(_) => 1,
                    Value::Number(_) => 2,
                    Value::String(_) => 3,
                    Value::Array(_) => 4,
                    Value::Object(_) => 5,
                }
            };

            let a_type = type_order(a_val);
            let b_type = type_order(b_val);
            if a_type != b_type {
                return a_type.cmp(&b_type);
            }

            super::filter::compare_values(a_val, b_val).unwrap_or(Ordering::Equal)
        }
    }
}
