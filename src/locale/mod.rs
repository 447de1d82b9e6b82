//! # Localization
//!
//! Localized fields are stored as one value per locale:
//! `{"title": {"en": "Hello", "es": "Hola"}}`.
//!
//! Reads collapse each localized field to the requested locale, falling
//! back to the fallback locale when a translation is missing. Writes
//! insert the incoming value under the write locale and leave the other
//! translations untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::{CmsError, CmsResult};
use crate::schema::{find_field, Field, FieldType, SchemaCatalog};
use crate::store::{FilterExpr, SortSpec};

/// Locale value that returns every translation unresolved
pub const ALL_LOCALES: &str = "all";

/// Fallback value that disables fallback
pub const NO_FALLBACK: &str = "none";

fn default_true() -> bool {
    true
}

/// Localization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationConfig {
    /// Supported locale codes
    pub locales: Vec<String>,

    /// Locale used when a request names none
    pub default_locale: String,

    /// Fall back to the default locale for missing translations
    #[serde(default = "default_true")]
    pub fallback: bool,
}

impl LocalizationConfig {
    pub fn new<I, S>(locales: I, default_locale: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            locales: locales.into_iter().map(Into::into).collect(),
            default_locale: default_locale.into(),
            fallback: true,
        }
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    /// Locale a write lands in
    pub fn write_locale(&self, requested: Option<&str>) -> CmsResult<String> {
        match requested {
            None | Some(ALL_LOCALES) => Ok(self.default_locale.clone()),
            Some(l) if self.has_locale(l) => Ok(l.to_string()),
            Some(l) => Err(CmsError::InvalidLocale(l.to_string())),
        }
    }

    /// Decide how a read collapses localized fields
    ///
    /// # Errors
    ///
    /// `InvalidLocale` when either locale is not configured.
    pub fn selection(
        &self,
        locale: Option<&str>,
        fallback_locale: Option<&str>,
    ) -> CmsResult<LocaleSelection> {
        let locale = match locale {
            Some(ALL_LOCALES) => return Ok(LocaleSelection::All),
            Some(l) if self.has_locale(l) => l.to_string(),
            Some(l) => return Err(CmsError::InvalidLocale(l.to_string())),
            None => self.default_locale.clone(),
        };

        let fallback = match fallback_locale {
            Some(NO_FALLBACK) => None,
            Some(l) if self.has_locale(l) => Some(l.to_string()),
            Some(l) => return Err(CmsError::InvalidLocale(l.to_string())),
            None if self.fallback => Some(self.default_locale.clone()),
            None => None,
        };

        Ok(LocaleSelection::Single { locale, fallback })
    }
}

/// How localized fields are collapsed on read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleSelection {
    /// Leave per-locale maps intact
    All,
    /// Pick one locale, optionally falling back to another
    Single {
        locale: String,
        fallback: Option<String>,
    },
}

/// Collapses localized fields of serialized documents
pub struct LocaleResolver<'a> {
    catalog: &'a SchemaCatalog,
    selection: &'a LocaleSelection,
}

impl<'a> LocaleResolver<'a> {
    pub fn new(catalog: &'a SchemaCatalog, selection: &'a LocaleSelection) -> Self {
        Self { catalog, selection }
    }

    /// Resolve `data` in place against `fields`
    pub fn resolve(&self, fields: &[Field], data: &mut Map<String, Value>) {
        let LocaleSelection::Single { locale, fallback } = self.selection else {
            return;
        };

        for field in fields {
            let Some(value) = data.get_mut(&field.name) else {
                continue;
            };

            if field.localized {
                if let Value::Object(per_locale) = value {
                    let picked = per_locale
                        .get(locale)
                        .filter(|v| !v.is_null())
                        .or_else(|| fallback.as_ref().and_then(|f| per_locale.get(f)))
                        .cloned();
                    match picked {
                        Some(v) => *value = v,
                        None => {
                            data.remove(&field.name);
                            continue;
                        }
                    }
                }
            }

            if let Some(value) = data.get_mut(&field.name) {
                self.resolve_nested(field, value);
            }
        }
    }

    fn resolve_nested(&self, field: &Field, value: &mut Value) {
        match &field.field_type {
            FieldType::Group { fields } => {
                if let Some(obj) = value.as_object_mut() {
                    self.resolve(fields, obj);
                }
            }
            FieldType::Array { fields, .. } => {
                for row in value.as_array_mut().into_iter().flatten() {
                    if let Some(obj) = row.as_object_mut() {
                        self.resolve(fields, obj);
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
                        self.resolve(&block.fields, obj);
                    }
                }
            }
            FieldType::Relationship { relation_to, .. } => {
                let Some(target) = self.catalog.collection(relation_to) else {
                    return;
                };
                // Only populated documents are objects; ids stay untouched
                match value {
                    Value::Object(doc) => self.resolve(&target.fields, doc),
                    Value::Array(items) => {
                        for item in items.iter_mut() {
                            if let Some(doc) = item.as_object_mut() {
                                self.resolve(&target.fields, doc);
                            }
                        }
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
}

/// Merge incoming write data into stored data
///
/// Localized values land under `locale`; other translations already
/// stored are kept. Keys absent from `incoming` keep their stored value.
/// With `locale = None` (localization disabled) this is a shallow merge.
pub fn merge_fields(
    fields: &[Field],
    incoming: &Map<String, Value>,
    existing: Option<&Map<String, Value>>,
    locale: Option<&str>,
) -> Map<String, Value> {
    let mut merged = existing.cloned().unwrap_or_default();

    for (key, value) in incoming {
        let Some(locale) = locale else {
            merged.insert(key.clone(), value.clone());
            continue;
        };
        let stored = existing.and_then(|e| e.get(key));
        let new_value = match find_field(fields, key) {
            Some(field) => merge_value(field, value, stored, locale),
            None => value.clone(),
        };
        merged.insert(key.clone(), new_value);
    }

    merged
}

fn merge_value(field: &Field, incoming: &Value, stored: Option<&Value>, locale: &str) -> Value {
    if field.localized {
        let mut per_locale = match stored {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        per_locale.insert(locale.to_string(), incoming.clone());
        return Value::Object(per_locale);
    }

    if !field.has_localized() {
        return incoming.clone();
    }

    match (&field.field_type, incoming) {
        (FieldType::Group { fields }, Value::Object(obj)) => {
            let stored = stored.and_then(Value::as_object);
            Value::Object(merge_fields(fields, obj, stored, Some(locale)))
        }
        (FieldType::Array { fields, .. }, Value::Array(rows)) => {
            let stored_rows = stored.and_then(Value::as_array);
            Value::Array(
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let stored_row = stored_rows.and_then(|r| r.get(i)).and_then(Value::as_object);
                        match row.as_object() {
                            Some(obj) => Value::Object(merge_fields(fields, obj, stored_row, Some(locale))),
                            None => row.clone(),
                        }
                    })
                    .collect(),
            )
        }
        (FieldType::Blocks { blocks }, Value::Array(rows)) => {
            let stored_rows = stored.and_then(Value::as_array);
            Value::Array(
                rows.iter()
                    .enumerate()
                    .map(|(i, row)| {
                        let Some(obj) = row.as_object() else {
                            return row.clone();
                        };
                        let block = obj
                            .get("blockType")
                            .and_then(Value::as_str)
                            .and_then(|t| blocks.iter().find(|b| b.slug == t));
                        let stored_row = stored_rows
                            .and_then(|r| r.get(i))
                            .and_then(Value::as_object)
                            .filter(|s| s.get("blockType") == obj.get("blockType"));
                        match block {
                            Some(block) => {
                                Value::Object(merge_fields(&block.fields, obj, stored_row, Some(locale)))
                            }
                            None => row.clone(),
                        }
                    })
                    .collect(),
            )
        }
        _ => incoming.clone(),
    }
}

/// Point filters on localized top-level fields at the locale's value
///
/// Paths that already name a configured locale (`title.en`) are kept.
pub fn localize_filters(
    fields: &[Field],
    filters: Vec<FilterExpr>,
    config: &LocalizationConfig,
    locale: &str,
) -> Vec<FilterExpr> {
    filters
        .into_iter()
        .map(|mut f| {
            f.field = localize_path(fields, &f.field, config, locale);
            f
        })
        .collect()
}

/// Point sort keys on localized top-level fields at the locale's value
pub fn localize_sort(
    fields: &[Field],
    sort: Vec<SortSpec>,
    config: &LocalizationConfig,
    locale: &str,
) -> Vec<SortSpec> {
    sort.into_iter()
        .map(|mut s| {
            s.field = localize_path(fields, &s.field, config, locale);
            s
        })
        .collect()
}

fn localize_path(fields: &[Field], path: &str, config: &LocalizationConfig, locale: &str) -> String {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    match find_field(fields, head) {
        Some(field) if field.localized => match rest {
            Some(rest) if rest.split('.').next().map(|s| config.has_locale(s)).unwrap_or(false) => {
                path.to_string()
            }
            Some(rest) => format!("{}.{}.{}", head, locale, rest),
            None => format!("{}.{}", head, locale),
        },
        _ => path.to_string(),
    }
}
