//! # Filter Expressions
//!
//! Field predicates for collection queries. Fields are addressed by dotted
//! path (`meta.title`, `title.en`). All filters in a query are ANDed.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equals; on array fields, contains
    Eq,
    /// Not equals
    Neq,
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
    /// Pattern match (`%` any sequence, `_` one char)
    Like,
    /// Value in list
    In,
    /// `is.null` / `is.notnull`
    Is,
}

impl FilterOperator {
    /// Parse the REST operator prefix
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(FilterOperator::Eq),
            "neq" => Some(FilterOperator::Neq),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "like" => Some(FilterOperator::Like),
            "in" => Some(FilterOperator::In),
            "is" => Some(FilterOperator::Is),
            _ => None,
        }
    }

    /// Get the operator string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::Is => "is",
        }
    }
}

/// A filter expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterExpr {
    /// Dotted path of the field to filter on
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Value to compare against
    pub value: Value,
}

impl FilterExpr {
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Eq, value)
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self::new(field, FilterOperator::Gt, value)
    }

    pub fn in_list(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(field, FilterOperator::In, Value::Array(values))
    }

    /// Check if a document matches this filter
    pub fn matches(&self, doc: &Value) -> bool {
        let field_value = match lookup_path(doc, &self.field) {
            Some(v) => v,
            None => return self.operator == FilterOperator::Is && self.value.is_null(),
        };

        match self.operator {
            FilterOperator::Eq => match field_value {
                Value::Array(items) if !self.value.is_array() => items.contains(&self.value),
                _ => loosely_equal(field_value, &self.value),
            },
            FilterOperator::Neq => !loosely_equal(field_value, &self.value),
            FilterOperator::Gt => compare_values(field_value, &self.value) == Some(Ordering::Greater),
            FilterOperator::Gte => matches!(
                compare_values(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FilterOperator::Lt => compare_values(field_value, &self.value) == Some(Ordering::Less),
            FilterOperator::Lte => matches!(
                compare_values(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FilterOperator::Like => match (field_value.as_str(), self.value.as_str()) {
                (Some(s), Some(pattern)) => like_match(s, pattern),
                _ => false,
            },
            FilterOperator::In => match self.value.as_array() {
                Some(list) => list.iter().any(|v| loosely_equal(field_value, v)),
                None => false,
            },
            FilterOperator::Is => {
                if self.value.is_null() {
                    field_value.is_null()
                } else {
                    !field_value.is_null()
                }
            }
        }
    }
}

/// Resolve a dotted path inside a JSON value. Numeric segments index arrays.
pub fn lookup_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Equality that lets a numeric string match a number and vice versa,
/// since REST filter values arrive untyped
fn loosely_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            match (s.parse::<f64>(), n.as_f64()) {
                (Ok(x), Some(y)) => x == y,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Ordering for comparable pairs; `None` for mismatched types
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// SQL LIKE matching: `%` any sequence, `_` exactly one char
///
/// Greedy with a single backtrack point at the last `%`, so the cost is
/// bounded by `value.len() * pattern.len()` however many wildcards appear.
fn like_match(value: &str, pattern: &str) -> bool {
    let value: Vec<char> = value.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut v, mut p) = (0, 0);
    // (pattern index after the last `%`, value index it was tried against)
    let mut backtrack: Option<(usize, usize)> = None;

    while v < value.len() {
        match pattern.get(p) {
            Some('%') => {
                p += 1;
                backtrack = Some((p, v));
            }
            Some('_') => {
                p += 1;
                v += 1;
            }
            Some(c) if *c == value[v] => {
                p += 1;
                v += 1;
            }
            _ => match backtrack {
                Some((after_wildcard, tried)) => {
                    p = after_wildcard;
                    v = tried + 1;
                    backtrack = Some((after_wildcard, v));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_eq_filter() {
        let filter = FilterExpr::eq("name", json!("Alice"));

        assert!(filter.matches(&json!({"name": "Alice"})));
        assert!(!filter.matches(&json!({"name": "Bob"})));
    }

    #[test]
    fn test_eq_on_array_is_contains() {
        let filter = FilterExpr::eq("tags", json!("rust"));
        assert!(filter.matches(&json!({"tags": ["go", "rust"]})));
        assert!(!filter.matches(&json!({"tags": ["go"]})));
    }

    #[test]
    fn test_dotted_path() {
        let filter = FilterExpr::eq("title.en", json!("Hello"));
        assert!(filter.matches(&json!({"title": {"en": "Hello", "es": "Hola"}})));
        assert!(!filter.matches(&json!({"title": "Hello"})));

        let doc = json!({"rows": [{"v": 1}, {"v": 2}]});
        assert_eq!(lookup_path(&doc, "rows.1.v"), Some(&json!(2)));
    }

    #[test]
    fn test_range_filters() {
        let doc = json!({"age": 25});
        assert!(FilterExpr::gt("age", json!(20)).matches(&doc));
        assert!(!FilterExpr::gt("age", json!(25)).matches(&doc));
        assert!(FilterExpr::new("age", FilterOperator::Gte, json!(25)).matches(&doc));
        assert!(FilterExpr::new("age", FilterOperator::Lt, json!(30)).matches(&doc));
        assert!(!FilterExpr::new("age", FilterOperator::Lte, json!(24)).matches(&doc));
    }

    #[test]
    fn test_range_on_mismatched_types_never_matches() {
        let doc = json!({"age": "old"});
        assert!(!FilterExpr::gt("age", json!(1)).matches(&doc));
        assert!(!FilterExpr::new("age", FilterOperator::Lt, json!(1)).matches(&doc));
    }

    #[test]
    fn test_numeric_string_equality() {
        assert!(FilterExpr::eq("count", json!("3")).matches(&json!({"count": 3})));
        assert!(FilterExpr::in_list("count", vec![json!("3"), json!("4")])
            .matches(&json!({"count": 4})));
    }

    #[test]
    fn test_like_filter() {
        let filter = FilterExpr::new("email", FilterOperator::Like, json!("%@example.com"));
        assert!(filter.matches(&json!({"email": "alice@example.com"})));
        assert!(!filter.matches(&json!({"email": "alice@test.com"})));

        let one = FilterExpr::new("code", FilterOperator::Like, json!("a_c"));
        assert!(one.matches(&json!({"code": "abc"})));
        assert!(!one.matches(&json!({"code": "abbc"})));
    }

    #[test]
    fn test_like_wildcard_runs() {
        let filter = FilterExpr::new("t", FilterOperator::Like, json!("%a%%b%"));
        assert!(filter.matches(&json!({"t": "xaxxbx"})));
        assert!(filter.matches(&json!({"t": "ab"})));
        assert!(!filter.matches(&json!({"t": "ba"})));

        assert!(FilterExpr::new("t", FilterOperator::Like, json!("%")).matches(&json!({"t": ""})));
        assert!(!FilterExpr::new("t", FilterOperator::Like, json!("_")).matches(&json!({"t": ""})));
    }

    #[test]
    fn test_like_many_wildcards_is_fast() {
        let value = "a".repeat(5_000);
        let pattern = format!("{}b", "%a".repeat(50));
        let filter = FilterExpr::new("t", FilterOperator::Like, json!(pattern));

        let started = std::time::Instant::now();
        assert!(!filter.matches(&json!({ "t": value })));
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        let hit = FilterExpr::new("t", FilterOperator::Like, json!("%a%a%a%a%a%a%b"));
        assert!(hit.matches(&json!({ "t": format!("{}b", "a".repeat(60)) })));
    }

    #[test]
    fn test_is_null() {
        let filter = FilterExpr::new("deleted_at", FilterOperator::Is, Value::Null);
        assert!(filter.matches(&json!({"name": "x"})));
        assert!(filter.matches(&json!({"deleted_at": null})));
        assert!(!filter.matches(&json!({"deleted_at": "2024-01-01"})));

        let not_null = FilterExpr::new("deleted_at", FilterOperator::Is, json!("notnull"));
        assert!(not_null.matches(&json!({"deleted_at": "2024-01-01"})));
    }

    #[test]
    fn test_operator_parse() {
        assert_eq!(FilterOperator::parse("gte"), Some(FilterOperator::Gte));
        assert_eq!(FilterOperator::parse("between"), None);
        assert_eq!(FilterOperator::Like.as_str(), "like");
    }
}
