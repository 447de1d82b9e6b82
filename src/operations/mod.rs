//! # Operations
//!
//! The orchestrated CRUD operations. Every operation runs the same five
//! stages, strictly in order, each awaiting the previous one:
//!
//! 1. Policy check (`Forbidden` aborts before any store access)
//! 2. Before-hook (its returned arguments replace the originals)
//! 3. Store access plus locale resolution (`NotFound` aborts)
//! 4. Serialization into a plain JSON document
//! 5. After-hook (its returned value replaces the result)
//!
//! Errors from any stage propagate to the caller untouched; there is no
//! retry and no partial result.

pub mod auth;
pub mod collections;
mod context;
pub mod globals;

use serde_json::{Map, Value};

use crate::core::context::{Api, OperationArgs};
use crate::core::error::{CmsError, CmsResult};
use crate::locale::{LocaleResolver, LocaleSelection};
use crate::registry::Registry;
use crate::schema::{find_field, strip_hidden, DocumentValidator, Field, FieldType, RESERVED_KEYS};
use crate::store::{Autopopulate, StoreQuery, StoredDocument};

pub use context::OperationContext;

/// Page size when `find` is called without a limit
pub const DEFAULT_LIMIT: usize = 10;

/// Largest page `find` will return
pub const MAX_LIMIT: usize = 1000;

/// Population mode for a read, with REST depth capped at the registry limit
pub(crate) fn autopopulate(registry: &Registry, args: &OperationArgs) -> Autopopulate {
    let depth = args.depth.map(|d| d.min(registry.max_depth()));
    Autopopulate::for_request(args.api, depth)
}

/// Locale selection for a read; `None` when localization is off
///
/// Checked before the store is queried so an unknown locale never costs
/// a lookup.
pub(crate) fn read_selection(
    registry: &Registry,
    args: &OperationArgs,
) -> CmsResult<Option<LocaleSelection>> {
    registry
        .localization()
        .map(|l| l.selection(args.locale.as_deref(), args.fallback_locale.as_deref()))
        .transpose()
}

/// Locale a write lands in; `None` when localization is off
pub(crate) fn write_locale(registry: &Registry, args: &OperationArgs) -> CmsResult<Option<String>> {
    registry
        .localization()
        .map(|l| l.write_locale(args.locale.as_deref()))
        .transpose()
}

/// REST queries may not filter or sort on hidden fields
///
/// A hidden value would otherwise be recoverable one predicate at a time.
/// In-process callers are trusted and keep full access.
pub(crate) fn reject_hidden_paths(fields: &[Field], args: &OperationArgs) -> CmsResult<()> {
    if args.api != Api::Rest {
        return Ok(());
    }
    let paths = args
        .filter
        .iter()
        .map(|f| f.field.as_str())
        .chain(args.sort.iter().map(|s| s.field.as_str()));
    for path in paths {
        if addresses_hidden(fields, path) {
            return Err(CmsError::invalid_request(format!(
                "Field cannot be queried: {}",
                path
            )));
        }
    }
    Ok(())
}

/// Whether a dotted path passes through a hidden field
fn addresses_hidden(fields: &[Field], path: &str) -> bool {
    let mut fields = fields;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let Some(field) = find_field(fields, segment) else {
            return false;
        };
        if field.hidden {
            return true;
        }
        fields = match &field.field_type {
            FieldType::Group { fields } => fields,
            FieldType::Array { fields, .. } => {
                if segments.peek().is_some_and(|s| s.parse::<usize>().is_ok()) {
                    segments.next();
                }
                fields
            }
            _ => return false,
        };
    }
    false
}

/// Collapse localized fields of a fetched document
pub(crate) fn localize(
    registry: &Registry,
    fields: &[Field],
    doc: &mut StoredDocument,
    selection: Option<&LocaleSelection>,
) {
    if let Some(selection) = selection {
        LocaleResolver::new(registry.catalog(), selection).resolve(fields, &mut doc.data);
    }
}

/// Plain JSON document with virtual `id`, hidden fields removed
pub(crate) fn serialize(fields: &[Field], timestamps: bool, mut doc: StoredDocument) -> Value {
    strip_hidden(fields, &mut doc.data);
    doc.to_json(true, timestamps)
}

/// Fetch one document and return it the way reads do
///
/// `NotFound` when the store has no match.
pub(crate) async fn read_document(
    ctx: &OperationContext,
    query: StoreQuery,
    fields: &[Field],
    timestamps: bool,
    selection: Option<&LocaleSelection>,
) -> CmsResult<Value> {
    let mut doc = ctx.store.find_one(query).await?.ok_or(CmsError::NotFound)?;
    localize(&ctx.registry, fields, &mut doc, selection);
    Ok(serialize(fields, timestamps, doc))
}

/// Write payload with pipeline-owned keys removed
pub(crate) fn incoming_data(args: &OperationArgs) -> CmsResult<Map<String, Value>> {
    match &args.data {
        Some(Value::Object(map)) => {
            let mut data = map.clone();
            for key in RESERVED_KEYS {
                data.remove(*key);
            }
            Ok(data)
        }
        Some(_) => Err(CmsError::invalid_request("Document data must be a JSON object")),
        None => Err(CmsError::invalid_request("Missing document data")),
    }
}

/// Validate merged stored data as seen in the write locale
///
/// Localized fields missing in the write locale are checked against the
/// default locale's value.
pub(crate) fn validate_write(
    registry: &Registry,
    fields: &[Field],
    merged: &Map<String, Value>,
    write_locale: Option<&str>,
) -> CmsResult<()> {
    let mut view = merged.clone();
    if let (Some(locale), Some(config)) = (write_locale, registry.localization()) {
        let selection = LocaleSelection::Single {
            locale: locale.to_string(),
            fallback: Some(config.default_locale.clone()),
        };
        LocaleResolver::new(registry.catalog(), &selection).resolve(fields, &mut view);
    }

    DocumentValidator::new(fields).validate(&Value::Object(view))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::access::{AccessConfig, AccessRule};
    use crate::auth::{JwtConfig, JwtManager};
    use crate::locale::LocalizationConfig;
    use crate::registry::Registry;
    use crate::schema::{CollectionSchema, Field, FieldType, GlobalSchema, SchemaCatalog};
    use crate::store::InMemoryStore;

    use super::OperationContext;

    pub(crate) fn catalog() -> Arc<SchemaCatalog> {
        Arc::new(SchemaCatalog::new(
            vec![
                CollectionSchema::new(
                    "users",
                    vec![Field::text("name"), Field::text("roles")],
                )
                .with_auth(),
                CollectionSchema::new(
                    "posts",
                    vec![
                        Field::text("title").required().localized(),
                        Field::new(
                            "status",
                            FieldType::Select {
                                options: vec!["draft".into(), "published".into()],
                                has_many: false,
                            },
                        )
                        .with_default(serde_json::json!("draft")),
                        Field::number("views"),
                        Field::relationship("author", "users"),
                        Field::text("internal_note").hidden(),
                    ],
                ),
                CollectionSchema::new("locked", vec![Field::text("name")]).with_access(
                    AccessConfig {
                        read: Some(AccessRule::Deny),
                        create: Some(AccessRule::Authenticated),
                        update: Some(AccessRule::Role("admin".into())),
                        delete: Some(AccessRule::Deny),
                    },
                ),
            ],
            vec![GlobalSchema::new(
                "settings",
                vec![
                    Field::text("site_name").localized(),
                    Field::relationship("owner", "users"),
                ],
            )],
        ))
    }

    pub(crate) fn registry() -> Registry {
        Registry::new(catalog())
            .with_localization(LocalizationConfig::new(["en", "es"], "en"))
            .with_max_depth(3)
            .with_jwt(JwtManager::new(JwtConfig::new("test-secret")))
    }

    pub(crate) fn context_with(registry: Registry) -> OperationContext {
        let catalog = Arc::clone(registry.catalog());
        OperationContext::new(Arc::new(registry), Arc::new(InMemoryStore::new(catalog)))
    }

    pub(crate) fn context() -> OperationContext {
        context_with(registry())
    }

    /// In-memory sink for fmt subscriber output
    #[derive(Clone, Default)]
    pub(crate) struct LogCapture(Arc<std::sync::Mutex<Vec<u8>>>);

    impl LogCapture {
        /// Debug-level subscriber writing into this capture
        pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer(self.clone())
                .finish()
        }

        pub(crate) fn occurrences(&self, needle: &str) -> usize {
            let bytes = self.0.lock().unwrap();
            String::from_utf8_lossy(&bytes).matches(needle).count()
        }
    }

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = LogCapture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }
}
