//! # Query Parameter Parser
//!
//! Parses REST query strings into operation arguments. Reserved keys
//! control depth, locale and pagination; every other key is a filter of
//! the form `field=op.value`.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::context::{Api, OperationArgs};
use crate::core::error::{CmsError, CmsResult};
use crate::store::{FilterExpr, FilterOperator, SortSpec};

/// Parsed query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pub depth: Option<u32>,
    pub locale: Option<String>,
    pub fallback_locale: Option<String>,
    pub limit: Option<usize>,
    pub page: Option<usize>,
    pub sort: Vec<SortSpec>,
    pub filters: Vec<FilterExpr>,
}

impl QueryParams {
    /// Parse query parameters from a HashMap
    pub fn parse(params: &HashMap<String, String>) -> CmsResult<Self> {
        let mut result = QueryParams::default();

        for (key, value) in params {
            match key.as_str() {
                "depth" => result.depth = Some(parse_number(key, value)?),
                "locale" => result.locale = Some(value.clone()),
                "fallback-locale" | "fallbackLocale" => {
                    result.fallback_locale = Some(value.clone())
                }
                "limit" => result.limit = Some(parse_number(key, value)?),
                "page" => result.page = Some(parse_number(key, value)?),
                "order" => result.sort = parse_order(value)?,
                _ => result.filters.push(parse_filter(key, value)),
            }
        }

        // HashMap order is arbitrary; keep filters stable for logging and tests
        result.filters.sort_by(|a, b| a.field.cmp(&b.field));
        Ok(result)
    }

    /// Operation arguments for a REST request against `slug`
    pub fn into_args(self, slug: &str) -> OperationArgs {
        OperationArgs {
            slug: slug.to_string(),
            api: Api::Rest,
            depth: self.depth,
            locale: self.locale,
            fallback_locale: self.fallback_locale,
            limit: self.limit,
            page: self.page,
            sort: self.sort,
            filter: self.filters,
            ..Default::default()
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> CmsResult<T> {
    value
        .parse()
        .map_err(|_| CmsError::invalid_request(format!("Invalid {}: {}", key, value)))
}

/// Parse order parameter (comma-separated field.direction)
fn parse_order(value: &str) -> CmsResult<Vec<SortSpec>> {
    let mut orders = Vec::new();

    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let spec = match part.rsplit_once('.') {
            Some((field, direction)) => match direction.to_lowercase().as_str() {
                "asc" => SortSpec::asc(field),
                "desc" => SortSpec::desc(field),
                // A dotted field path without direction
                _ => SortSpec::asc(part),
            },
            None => SortSpec::asc(part),
        };
        if spec.field.is_empty() {
            return Err(CmsError::invalid_request(format!(
                "Invalid order: {}",
                value
            )));
        }
        orders.push(spec);
    }

    Ok(orders)
}

/// Parse a filter expression from key=value
///
/// Without a known operator prefix the whole value is an equality test.
fn parse_filter(field: &str, value: &str) -> FilterExpr {
    if let Some((op, rest)) = value.split_once('.') {
        if let Some(operator) = FilterOperator::parse(op) {
            return FilterExpr::new(field, operator, parse_filter_value(operator, rest));
        }
    }
    FilterExpr::eq(field, parse_filter_value(FilterOperator::Eq, value))
}

/// Parse a filter value (handles lists for 'in' operator)
fn parse_filter_value(operator: FilterOperator, value: &str) -> Value {
    if operator == FilterOperator::Like {
        return Value::String(value.to_string());
    }

    if value.starts_with('(') && value.ends_with(')') && value.len() >= 2 {
        let inner = &value[1..value.len() - 1];
        return Value::Array(
            inner
                .split(',')
                .map(|s| scalar(s.trim()))
                .collect(),
        );
    }

    scalar(value)
}

fn scalar(value: &str) -> Value {
    match value {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = value.parse::<i64>() {
                return Value::Number(n.into());
            }
            if let Some(num) = value.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
                return Value::Number(num);
            }
            Value::String(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_order() {
        let orders = parse_order("createdAt.desc,title.asc,meta.rank").unwrap();
        assert_eq!(
            orders,
            vec![
                SortSpec::desc("createdAt"),
                SortSpec::asc("title"),
                SortSpec::asc("meta.rank"),
            ]
        );
    }

    #[test]
    fn test_parse_filter() {
        let filter = parse_filter("views", "gt.18");
        assert_eq!(filter.operator, FilterOperator::Gt);
        assert_eq!(filter.value, json!(18));

        let eq_filter = parse_filter("name", "John");
        assert_eq!(eq_filter.operator, FilterOperator::Eq);
        assert_eq!(eq_filter.value, json!("John"));

        let dotted = parse_filter("email", "a.b@c.co");
        assert_eq!(dotted.operator, FilterOperator::Eq);
        assert_eq!(dotted.value, json!("a.b@c.co"));
    }

    #[test]
    fn test_parse_in_and_like() {
        let filter = parse_filter("status", "in.(draft,published)");
        assert_eq!(filter.operator, FilterOperator::In);
        assert_eq!(filter.value, json!(["draft", "published"]));

        let like = parse_filter("title", "like.100%");
        assert_eq!(like.value, json!("100%"));
    }

    #[test]
    fn test_full_query_params() {
        let query = QueryParams::parse(&params(&[
            ("depth", "2"),
            ("locale", "es"),
            ("fallback-locale", "none"),
            ("limit", "20"),
            ("page", "3"),
            ("order", "title.desc"),
            ("status", "eq.published"),
        ]))
        .unwrap();

        assert_eq!(query.depth, Some(2));
        assert_eq!(query.fallback_locale.as_deref(), Some("none"));
        assert_eq!(query.page, Some(3));
        assert_eq!(query.filters.len(), 1);

        let args = query.into_args("posts");
        assert_eq!(args.api, Api::Rest);
        assert_eq!(args.slug, "posts");
        assert_eq!(args.locale.as_deref(), Some("es"));
        assert_eq!(args.limit, Some(20));
        assert_eq!(args.sort, vec![SortSpec::desc("title")]);
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(QueryParams::parse(&params(&[("depth", "-1")])).is_err());
        assert!(QueryParams::parse(&params(&[("limit", "many")])).is_err());
    }
}
