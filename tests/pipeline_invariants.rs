//! Pipeline Invariant Tests
//!
//! Every operation runs policy, before hook, store, serialize, after hook
//! in that order. These tests wrap the in-memory store so each store call
//! lands in the same log as the hook and policy invocations:
//! - A denied policy stops the operation before any hook or store call
//! - Hooks run once, in order, and their return values replace the
//!   working arguments or result
//! - Hook errors reach the caller unchanged
//! - A missing document never reaches the after hook

use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use serde_json::{json, Map, Value};

use quire::access::policy_fn;
use quire::auth::User;
use quire::core::{Api, CmsError, LocalApi, OperationArgs};
use quire::hooks::Hooks;
use quire::registry::{AccessKind, Registry};
use quire::schema::SchemaCatalog;
use quire::store::{
    DocumentStore, FindQuery, FindResult, InMemoryStore, StoreQuery, StoreResult, StoredDocument,
};
use quire::QuireConfig;

// =============================================================================
// Helper Functions
// =============================================================================

type CallLog = Arc<Mutex<Vec<String>>>;

const CONFIG: &str = r#"{
    "localization": { "locales": ["en", "es"], "default_locale": "en" },
    "collections": [{
        "slug": "posts",
        "fields": [
            { "name": "title", "type": "text", "required": true, "localized": true },
            { "name": "status", "type": "select", "options": ["draft", "published"], "default_value": "draft" }
        ]
    }],
    "globals": [{
        "slug": "settings",
        "fields": [{ "name": "site_name", "type": "text", "localized": true }]
    }]
}"#;

/// In-memory store that records every call
struct RecordingStore {
    inner: InMemoryStore,
    log: CallLog,
}

impl RecordingStore {
    fn record(&self, call: &str) {
        self.log.lock().unwrap().push(format!("store.{}", call));
    }
}

impl DocumentStore for RecordingStore {
    fn find_one(&self, query: StoreQuery) -> BoxFuture<'_, StoreResult<Option<StoredDocument>>> {
        self.record("find_one");
        self.inner.find_one(query)
    }

    fn find(&self, query: FindQuery) -> BoxFuture<'_, StoreResult<FindResult>> {
        self.record("find");
        self.inner.find(query)
    }

    fn create<'a>(
        &'a self,
        collection: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>> {
        self.record("create");
        self.inner.create(collection, data)
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>> {
        self.record("update");
        self.inner.update(collection, id, data)
    }

    fn delete<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, StoreResult<Option<StoredDocument>>> {
        self.record("delete");
        self.inner.delete(collection, id)
    }

    fn upsert_global<'a>(
        &'a self,
        global_type: &'a str,
        data: Map<String, Value>,
    ) -> BoxFuture<'a, StoreResult<StoredDocument>> {
        self.record("upsert_global");
        self.inner.upsert_global(global_type, data)
    }
}

fn catalog() -> Arc<SchemaCatalog> {
    let config = QuireConfig::from_json(CONFIG).unwrap();
    Arc::new(SchemaCatalog::new(config.collections, config.globals))
}

fn base_registry() -> Registry {
    let config = QuireConfig::from_json(CONFIG).unwrap();
    Registry::new(catalog()).with_localization(config.localization.unwrap())
}

fn setup(registry: Registry) -> (LocalApi, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let store = RecordingStore {
        inner: InMemoryStore::new(catalog()),
        log: Arc::clone(&log),
    };
    (LocalApi::new(Arc::new(registry), Arc::new(store)), log)
}

fn entries(log: &CallLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn clear(log: &CallLog) {
    log.lock().unwrap().clear();
}

/// Hooks that append `<name>` to the log and pass values through
fn recording_hooks(log: &CallLog) -> Hooks {
    let before = |name: &'static str| {
        let log = Arc::clone(log);
        move |args: OperationArgs| {
            log.lock().unwrap().push(name.to_string());
            async move { Ok::<_, CmsError>(args) }
        }
    };
    let after = |name: &'static str| {
        let log = Arc::clone(log);
        move |_args: OperationArgs, result: Value| {
            log.lock().unwrap().push(name.to_string());
            async move { Ok::<_, CmsError>(result) }
        }
    };

    Hooks::new()
        .before_read(before("before_read"))
        .after_read(after("after_read"))
        .before_create(before("before_create"))
        .after_create(after("after_create"))
        .before_update(before("before_update"))
        .after_update(after("after_update"))
        .before_delete(before("before_delete"))
        .after_delete(after("after_delete"))
}

fn recording_policy(log: &CallLog, allow: bool) -> Arc<dyn quire::access::Policy> {
    let log = Arc::clone(log);
    policy_fn(move |_user| {
        log.lock().unwrap().push("policy".to_string());
        allow
    })
}

/// Registry whose `posts` collection records hooks and the given policy
fn instrumented(kind: AccessKind, allow: bool) -> (LocalApi, CallLog) {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let registry = base_registry()
        .with_collection_hooks("posts", recording_hooks(&log))
        .unwrap()
        .with_collection_policy("posts", kind, recording_policy(&log, allow))
        .unwrap();

    let store = RecordingStore {
        inner: InMemoryStore::new(catalog()),
        log: Arc::clone(&log),
    };
    (LocalApi::new(Arc::new(registry), Arc::new(store)), log)
}

async fn seed(api: &LocalApi, log: &CallLog) -> String {
    let created = api
        .create(OperationArgs::new("posts").with_data(json!({"title": "Hello"})))
        .await
        .unwrap();
    clear(log);
    created["id"].as_str().unwrap().to_string()
}

// =============================================================================
// Stage Ordering Tests
// =============================================================================

/// find_by_id runs every stage exactly once, in order.
#[tokio::test]
async fn test_read_stage_order() {
    let (api, log) = instrumented(AccessKind::Read, true);
    let id = seed(&api, &log).await;

    api.find_by_id(OperationArgs::new("posts").with_id(&id))
        .await
        .unwrap();

    assert_eq!(
        entries(&log),
        vec!["policy", "before_read", "store.find_one", "after_read"]
    );
}

/// create: policy, before hook, insert, re-read, after hook.
#[tokio::test]
async fn test_create_stage_order() {
    let (api, log) = instrumented(AccessKind::Create, true);

    api.create(OperationArgs::new("posts").with_data(json!({"title": "Hi"})))
        .await
        .unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "policy",
            "before_create",
            "store.create",
            "store.find_one",
            "after_create"
        ]
    );
}

/// update reads the existing document before writing.
#[tokio::test]
async fn test_update_stage_order() {
    let (api, log) = instrumented(AccessKind::Update, true);
    let id = seed(&api, &log).await;

    api.update(
        OperationArgs::new("posts")
            .with_id(&id)
            .with_data(json!({"status": "published"})),
    )
    .await
    .unwrap();

    assert_eq!(
        entries(&log),
        vec![
            "policy",
            "before_update",
            "store.find_one",
            "store.update",
            "store.find_one",
            "after_update"
        ]
    );
}

/// find runs the after hook once per returned document.
#[tokio::test]
async fn test_find_runs_after_hook_per_document() {
    let (api, log) = instrumented(AccessKind::Read, true);
    seed(&api, &log).await;
    seed(&api, &log).await;

    let result = api.find(OperationArgs::new("posts")).await.unwrap();
    assert_eq!(result["totalDocs"], 2);

    assert_eq!(
        entries(&log),
        vec!["policy", "before_read", "store.find", "after_read", "after_read"]
    );
}

// =============================================================================
// Policy Tests
// =============================================================================

/// A denying policy touches neither hooks nor the store.
#[tokio::test]
async fn test_denied_policy_short_circuits() {
    for kind in [
        AccessKind::Read,
        AccessKind::Create,
        AccessKind::Update,
        AccessKind::Delete,
    ] {
        let (api, log) = instrumented(kind, false);
        let args = OperationArgs::new("posts")
            .with_id("any")
            .with_data(json!({"title": "x"}));

        let result = match kind {
            AccessKind::Read => api.find_by_id(args).await,
            AccessKind::Create => api.create(args).await,
            AccessKind::Update => api.update(args).await,
            AccessKind::Delete => api.delete(args).await,
        };

        assert!(matches!(result, Err(CmsError::Forbidden)), "{:?}", kind);
        assert_eq!(entries(&log), vec!["policy"], "{:?}", kind);
    }
}

/// The policy sees the caller from the arguments.
#[tokio::test]
async fn test_policy_receives_user() {
    let registry = base_registry()
        .with_global_policy(
            "settings",
            AccessKind::Update,
            policy_fn(|user| user.map(|u| u.has_role("admin")).unwrap_or(false)),
        )
        .unwrap();
    let (api, _log) = setup(registry);

    let data = json!({"site_name": "Quire"});
    let anonymous = api
        .update_global(OperationArgs::new("settings").with_data(data.clone()))
        .await;
    assert!(matches!(anonymous, Err(CmsError::Forbidden)));

    let admin = User::new("u1", "a@example.com", "users").with_roles(["admin"]);
    let saved = api
        .update_global(
            OperationArgs::new("settings")
                .with_user(admin)
                .with_data(data),
        )
        .await
        .unwrap();
    assert_eq!(saved["site_name"], "Quire");
}

// =============================================================================
// Hook Semantics Tests
// =============================================================================

/// Before-hook errors propagate with their status, before any store call.
#[tokio::test]
async fn test_before_hook_error_is_unchanged() {
    let log: CallLog = Arc::new(Mutex::new(Vec::new()));
    let hooks = Hooks::new().before_delete(|_args: OperationArgs| async move {
        Err::<OperationArgs, _>(CmsError::hook_with_status("Posts are archived", 409))
    });
    let registry = base_registry()
        .with_collection_hooks("posts", hooks)
        .unwrap();
    let store = RecordingStore {
        inner: InMemoryStore::new(catalog()),
        log: Arc::clone(&log),
    };
    let api = LocalApi::new(Arc::new(registry), Arc::new(store));

    let err = api
        .delete(OperationArgs::new("posts").with_id("p1"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 409);
    assert_eq!(err.to_string(), "Posts are archived");
    assert!(entries(&log).is_empty());
}

/// The before hook's returned arguments drive the rest of the pipeline.
#[tokio::test]
async fn test_before_hook_rewrites_locale() {
    let hooks = Hooks::new().before_read(|args: OperationArgs| async move {
        Ok::<_, CmsError>(args.with_locale("es"))
    });
    let registry = base_registry()
        .with_collection_hooks("posts", hooks)
        .unwrap();
    let (api, _log) = setup(registry);

    let created = api
        .create(OperationArgs::new("posts").with_data(json!({"title": "Hello"})))
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    api.update(
        OperationArgs::new("posts")
            .with_id(&id)
            .with_locale("es")
            .with_data(json!({"title": "Hola"})),
    )
    .await
    .unwrap();

    let doc = api
        .find_by_id(OperationArgs::new("posts").with_id(&id).with_locale("en"))
        .await
        .unwrap();
    assert_eq!(doc["title"], "Hola");
}

/// The after hook's return value replaces the result outright.
#[tokio::test]
async fn test_after_hook_replaces_result() {
    let hooks = Hooks::new().after_create(|_args: OperationArgs, doc: Value| async move {
        Ok::<_, CmsError>(json!({ "wrapped": doc["title"].clone() }))
    });
    let registry = base_registry()
        .with_collection_hooks("posts", hooks)
        .unwrap();
    let (api, _log) = setup(registry);

    let result = api
        .create(OperationArgs::new("posts").with_data(json!({"title": "Hello"})))
        .await
        .unwrap();
    assert_eq!(result, json!({ "wrapped": "Hello" }));
}

/// After-hook errors also reach the caller unchanged, after the write.
#[tokio::test]
async fn test_after_hook_error_is_unchanged() {
    let hooks = Hooks::new().after_update(|_args: OperationArgs, _doc: Value| async move {
        Err::<Value, _>(CmsError::hook_with_status("audit sink offline", 503))
    });
    let registry = base_registry()
        .with_global_hooks("settings", hooks)
        .unwrap();
    let (api, log) = setup(registry);

    let err = api
        .update_global(OperationArgs::new("settings").with_data(json!({"site_name": "Q"})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 503);
    assert!(entries(&log).contains(&"store.upsert_global".to_string()));
}

// =============================================================================
// Not Found Tests
// =============================================================================

/// A missing id ends with NotFound and never reaches the after hook.
#[tokio::test]
async fn test_not_found_skips_after_hook() {
    let (api, log) = instrumented(AccessKind::Delete, true);

    let err = api
        .delete(OperationArgs::new("posts").with_id("missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, CmsError::NotFound));
    assert_eq!(
        entries(&log),
        vec!["policy", "before_delete", "store.find_one"]
    );
}

/// An unsaved global reads as NotFound.
#[tokio::test]
async fn test_unsaved_global_not_found() {
    let (api, _log) = setup(base_registry());
    let err = api
        .find_global(OperationArgs::new("settings"))
        .await
        .unwrap_err();
    assert!(matches!(err, CmsError::NotFound));
}

// =============================================================================
// Locale Tests
// =============================================================================

/// Unknown locales are rejected before the store is consulted.
#[tokio::test]
async fn test_invalid_locale_before_store() {
    let (api, log) = instrumented(AccessKind::Read, true);

    let err = api
        .find_by_id(OperationArgs::new("posts").with_id("p1").with_locale("fr"))
        .await
        .unwrap_err();

    assert!(matches!(err, CmsError::InvalidLocale(ref l) if l == "fr"));
    assert!(!entries(&log).iter().any(|e| e.starts_with("store.")));
}

/// Fallback fills missing translations unless disabled with "none".
#[tokio::test]
async fn test_locale_fallback() {
    let (api, _log) = setup(base_registry());
    let created = api
        .create(OperationArgs::new("posts").with_data(json!({"title": "Hello"})))
        .await
        .unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let spanish = api
        .find_by_id(OperationArgs::new("posts").with_id(&id).with_locale("es"))
        .await
        .unwrap();
    assert_eq!(spanish["title"], "Hello");

    let strict = api
        .find_by_id(
            OperationArgs::new("posts")
                .with_id(&id)
                .with_locale("es")
                .with_fallback_locale("none"),
        )
        .await
        .unwrap();
    assert!(strict.get("title").is_none());

    let all = api
        .find_by_id(OperationArgs::new("posts").with_id(&id).with_locale("all"))
        .await
        .unwrap();
    assert_eq!(all["title"], json!({"en": "Hello"}));
}

// =============================================================================
// Population Depth Tests
// =============================================================================

const LINKED_CONFIG: &str = r#"{
    "collections": [
        { "slug": "authors", "fields": [{ "name": "name", "type": "text" }] },
        {
            "slug": "articles",
            "fields": [
                { "name": "headline", "type": "text" },
                { "name": "author", "type": "relationship", "relation_to": "authors" }
            ]
        },
        {
            "slug": "comments",
            "fields": [
                { "name": "body", "type": "text" },
                { "name": "article", "type": "relationship", "relation_to": "articles" }
            ]
        }
    ]
}"#;

/// Local API over a store that populates `default_depth` levels on its own
async fn linked_api(default_depth: u32) -> (LocalApi, String) {
    let config = QuireConfig::from_json(LINKED_CONFIG).unwrap();
    let catalog = Arc::new(SchemaCatalog::new(config.collections, config.globals));
    let store = InMemoryStore::new(Arc::clone(&catalog)).with_default_depth(default_depth);
    let api = LocalApi::new(Arc::new(Registry::new(catalog)), Arc::new(store));

    let author = api
        .create(OperationArgs::new("authors").with_data(json!({"name": "Ann"})))
        .await
        .unwrap();
    let article = api
        .create(OperationArgs::new("articles").with_data(json!({
            "headline": "Depth",
            "author": author["id"]
        })))
        .await
        .unwrap();
    let comment = api
        .create(OperationArgs::new("comments").with_data(json!({
            "body": "Nice",
            "article": article["id"]
        })))
        .await
        .unwrap();
    (api, comment["id"].as_str().unwrap().to_string())
}

/// REST depth controls how many relationship levels are embedded.
#[tokio::test]
async fn test_rest_depth_embeds_levels() {
    let (api, id) = linked_api(0).await;
    let rest = |depth: Option<u32>| {
        let args = OperationArgs::new("comments").with_id(&id).with_api(Api::Rest);
        match depth {
            Some(d) => args.with_depth(d),
            None => args,
        }
    };

    let two = api.find_by_id(rest(Some(2))).await.unwrap();
    assert_eq!(two["article"]["headline"], "Depth");
    assert_eq!(two["article"]["author"]["name"], "Ann");

    let one = api.find_by_id(rest(Some(1))).await.unwrap();
    assert_eq!(one["article"]["headline"], "Depth");
    assert!(one["article"]["author"].is_string());

    let none = api.find_by_id(rest(None)).await.unwrap();
    assert!(none["article"].is_string());
}

/// Outside REST the store default applies whatever depth is passed.
#[tokio::test]
async fn test_local_depth_uses_store_default() {
    let (api, id) = linked_api(1).await;

    for depth in [0, 2] {
        let doc = api
            .find_by_id(OperationArgs::new("comments").with_id(&id).with_depth(depth))
            .await
            .unwrap();
        assert_eq!(doc["article"]["headline"], "Depth");
        assert!(doc["article"]["author"].is_string());
    }

    let rest = api
        .find_by_id(OperationArgs::new("comments").with_id(&id).with_api(Api::Rest))
        .await
        .unwrap();
    assert!(rest["article"].is_string());
}
