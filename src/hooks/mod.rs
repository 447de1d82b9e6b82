//! Lifecycle hooks
//!
//! Optional callbacks attached to a collection or global. A before-hook
//! receives the operation arguments and returns the arguments the rest of
//! the pipeline will use. An after-hook receives the serialized result and
//! returns the value handed back to the caller. In both cases the return
//! value replaces the working value outright.
//!
//! Hooks are awaited exactly once. Their errors reach the caller unchanged.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;

/// Runs before the store stage and may rewrite the arguments
pub trait BeforeHook: Send + Sync {
    fn run(&self, args: OperationArgs) -> BoxFuture<'_, CmsResult<OperationArgs>>;
}

/// Runs after serialization and may rewrite the result
pub trait AfterHook: Send + Sync {
    fn run(&self, args: OperationArgs, result: Value) -> BoxFuture<'_, CmsResult<Value>>;
}

impl<F, Fut> BeforeHook for F
where
    F: Fn(OperationArgs) -> Fut + Send + Sync,
    Fut: Future<Output = CmsResult<OperationArgs>> + Send + 'static,
{
    fn run(&self, args: OperationArgs) -> BoxFuture<'_, CmsResult<OperationArgs>> {
        Box::pin(self(args))
    }
}

impl<F, Fut> AfterHook for F
where
    F: Fn(OperationArgs, Value) -> Fut + Send + Sync,
    Fut: Future<Output = CmsResult<Value>> + Send + 'static,
{
    fn run(&self, args: OperationArgs, result: Value) -> BoxFuture<'_, CmsResult<Value>> {
        Box::pin(self(args, result))
    }
}

/// Hook slots for one collection or global
#[derive(Clone, Default)]
pub struct Hooks {
    pub before_read: Option<Arc<dyn BeforeHook>>,
    pub after_read: Option<Arc<dyn AfterHook>>,
    pub before_create: Option<Arc<dyn BeforeHook>>,
    pub after_create: Option<Arc<dyn AfterHook>>,
    pub before_update: Option<Arc<dyn BeforeHook>>,
    pub after_update: Option<Arc<dyn AfterHook>>,
    pub before_delete: Option<Arc<dyn BeforeHook>>,
    pub after_delete: Option<Arc<dyn AfterHook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_read(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before_read = Some(Arc::new(hook));
        self
    }

    pub fn after_read(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after_read = Some(Arc::new(hook));
        self
    }

    pub fn before_create(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before_create = Some(Arc::new(hook));
        self
    }

    pub fn after_create(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after_create = Some(Arc::new(hook));
        self
    }

    pub fn before_update(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before_update = Some(Arc::new(hook));
        self
    }

    pub fn after_update(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after_update = Some(Arc::new(hook));
        self
    }

    pub fn before_delete(mut self, hook: impl BeforeHook + 'static) -> Self {
        self.before_delete = Some(Arc::new(hook));
        self
    }

    pub fn after_delete(mut self, hook: impl AfterHook + 'static) -> Self {
        self.after_delete = Some(Arc::new(hook));
        self
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before_read", &self.before_read.is_some())
            .field("after_read", &self.after_read.is_some())
            .field("before_create", &self.before_create.is_some())
            .field("after_create", &self.after_create.is_some())
            .field("before_update", &self.before_update.is_some())
            .field("after_update", &self.after_update.is_some())
            .field("before_delete", &self.before_delete.is_some())
            .field("after_delete", &self.after_delete.is_some())
            .finish()
    }
}

/// Run an optional before-hook; without one the arguments pass through
pub async fn run_before_hook(
    hook: Option<&Arc<dyn BeforeHook>>,
    args: OperationArgs,
) -> CmsResult<OperationArgs> {
    match hook {
        Some(hook) => hook.run(args).await,
        None => Ok(args),
    }
}

/// Run an optional after-hook; without one the result passes through
pub async fn run_after_hook(
    hook: Option<&Arc<dyn AfterHook>>,
    args: OperationArgs,
    result: Value,
) -> CmsResult<Value> {
    match hook {
        Some(hook) => hook.run(args, result).await,
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::CmsError;
    use serde_json::json;

    #[tokio::test]
    async fn test_absent_hooks_pass_through() {
        let args = OperationArgs::new("posts").with_locale("en");
        let args = run_before_hook(None, args).await.unwrap();
        assert_eq!(args.locale.as_deref(), Some("en"));

        let result = run_after_hook(None, args, json!({"id": "1"})).await.unwrap();
        assert_eq!(result, json!({"id": "1"}));
    }

    #[tokio::test]
    async fn test_before_hook_replaces_args() {
        let hooks = Hooks::new().before_read(|args: OperationArgs| async move {
            Ok::<_, CmsError>(args.with_locale("es"))
        });

        let args = run_before_hook(hooks.before_read.as_ref(), OperationArgs::new("posts"))
            .await
            .unwrap();
        assert_eq!(args.locale.as_deref(), Some("es"));
    }

    #[tokio::test]
    async fn test_after_hook_replaces_result() {
        let hooks = Hooks::new().after_read(|_args: OperationArgs, _result: Value| async move {
            Ok::<_, CmsError>(json!({"replaced": true}))
        });

        let result = run_after_hook(
            hooks.after_read.as_ref(),
            OperationArgs::new("posts"),
            json!({"id": "1"}),
        )
        .await
        .unwrap();
        assert_eq!(result, json!({"replaced": true}));
    }

    #[tokio::test]
    async fn test_hook_error_propagates() {
        let hooks = Hooks::new().before_delete(|_args: OperationArgs| async move {
            Err::<OperationArgs, _>(CmsError::hook_with_status("locked", 423))
        });

        let err = run_before_hook(hooks.before_delete.as_ref(), OperationArgs::new("posts"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 423);
    }

    #[test]
    fn test_debug_shows_slots() {
        let hooks = Hooks::new().after_read(|_a: OperationArgs, r: Value| async move { Ok::<_, CmsError>(r) });
        let debug = format!("{:?}", hooks);
        assert!(debug.contains("after_read: true"));
        assert!(debug.contains("before_read: false"));
    }
}
