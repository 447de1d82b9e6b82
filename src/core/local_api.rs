//! Local API
//!
//! In-process entry point to the operation pipeline. The REST layer is a
//! thin client of this type; applications embedding the CMS call it
//! directly.

use std::sync::Arc;

use serde_json::Value;

use crate::auth::User;
use crate::core::context::OperationArgs;
use crate::core::error::CmsResult;
use crate::core::executor::CmsExecutor;
use crate::core::middleware::observe::{ObserveMiddleware, OperationStats, StatsSnapshot};
use crate::core::operation::Operation;
use crate::core::pipeline::Pipeline;
use crate::operations::{auth, OperationContext};
use crate::registry::Registry;
use crate::store::DocumentStore;

/// Pipeline facade over a registry and a store
pub struct LocalApi {
    pipeline: Pipeline,
    ctx: OperationContext,
    stats: Arc<OperationStats>,
}

impl LocalApi {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn DocumentStore>) -> Self {
        Self::from_context(OperationContext::new(registry, store))
    }

    pub fn from_context(ctx: OperationContext) -> Self {
        let stats = Arc::new(OperationStats::default());
        let pipeline = Pipeline::new(CmsExecutor::new(ctx.clone()))
            .with_middleware(ObserveMiddleware::with_stats(Arc::clone(&stats)));

        Self {
            pipeline,
            ctx,
            stats,
        }
    }

    /// Run an arbitrary operation through the pipeline
    pub async fn execute(&self, op: Operation) -> CmsResult<Value> {
        self.pipeline.execute(op).await
    }

    pub async fn find_global(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::FindGlobal(args)).await
    }

    pub async fn update_global(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::UpdateGlobal(args)).await
    }

    pub async fn find(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::Find(args)).await
    }

    pub async fn find_by_id(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::FindById(args)).await
    }

    pub async fn create(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::Create(args)).await
    }

    pub async fn update(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::Update(args)).await
    }

    pub async fn delete(&self, args: OperationArgs) -> CmsResult<Value> {
        self.execute(Operation::Delete(args)).await
    }

    /// Exchange credentials for a token
    pub async fn login(&self, collection: &str, email: &str, password: &str) -> CmsResult<Value> {
        auth::login(&self.ctx, collection, email, password).await
    }

    /// Mail a reset token to the owner of `email`, if any
    pub async fn forgot_password(&self, collection: &str, email: &str) -> CmsResult<Value> {
        auth::forgot_password(&self.ctx, collection, email).await
    }

    /// Redeem a reset token and set a new password
    pub async fn reset_password(
        &self,
        collection: &str,
        token: &str,
        password: &str,
    ) -> CmsResult<Value> {
        auth::reset_password(&self.ctx, collection, token, password).await
    }

    /// Current user document for `args.user`
    pub async fn me(&self, args: OperationArgs) -> CmsResult<Value> {
        auth::me(&self.ctx, args).await
    }

    /// Resolve a bearer token to a principal
    pub async fn resolve_token(&self, token: &str) -> CmsResult<User> {
        auth::resolve_token(&self.ctx, token).await
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.ctx.registry
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.ctx.store
    }

    /// Outcome counters for operations run so far
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for LocalApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalApi")
            .field("registry", &self.ctx.registry)
            .field("middleware", &self.pipeline.middleware_count())
            .finish()
    }
}
