//! CMS Executor
//!
//! Final pipeline stage. Routes each operation to its orchestrated
//! implementation in [`crate::operations`].

use futures_util::future::BoxFuture;

use crate::core::operation::Operation;
use crate::core::pipeline::{OperationExecutor, OperationResult};
use crate::operations::{collections, globals, OperationContext};

/// Executor backed by a registry and a document store
#[derive(Clone)]
pub struct CmsExecutor {
    ctx: OperationContext,
}

impl CmsExecutor {
    pub fn new(ctx: OperationContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &OperationContext {
        &self.ctx
    }
}

impl OperationExecutor for CmsExecutor {
    fn execute(&self, op: Operation) -> BoxFuture<'_, OperationResult> {
        let ctx = &self.ctx;
        Box::pin(async move {
            match op {
                Operation::FindGlobal(args) => globals::find_one(ctx, args).await,
                Operation::UpdateGlobal(args) => globals::update(ctx, args).await,
                Operation::Find(args) => collections::find(ctx, args).await,
                Operation::FindById(args) => collections::find_by_id(ctx, args).await,
                Operation::Create(args) => collections::create(ctx, args).await,
                Operation::Update(args) => collections::update(ctx, args).await,
                Operation::Delete(args) => collections::delete(ctx, args).await,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::OperationArgs;
    use crate::core::error::CmsError;
    use crate::operations::test_support::context;
    use serde_json::json;

    #[tokio::test]
    async fn test_dispatches_collection_operations() {
        let executor = CmsExecutor::new(context());

        let created = executor
            .execute(Operation::Create(
                OperationArgs::new("posts").with_data(json!({"title": "Hi"})),
            ))
            .await
            .unwrap();
        let id = created["id"].as_str().unwrap().to_string();

        let found = executor
            .execute(Operation::FindById(OperationArgs::new("posts").with_id(&id)))
            .await
            .unwrap();
        assert_eq!(found["title"], "Hi");

        let listed = executor
            .execute(Operation::Find(OperationArgs::new("posts")))
            .await
            .unwrap();
        assert_eq!(listed["totalDocs"], 1);

        executor
            .execute(Operation::Delete(OperationArgs::new("posts").with_id(&id)))
            .await
            .unwrap();
        let gone = executor
            .execute(Operation::FindById(OperationArgs::new("posts").with_id(&id)))
            .await;
        assert!(matches!(gone, Err(CmsError::NotFound)));
    }

    #[tokio::test]
    async fn test_dispatches_global_operations() {
        let executor = CmsExecutor::new(context());
        executor
            .execute(Operation::UpdateGlobal(
                OperationArgs::new("settings").with_data(json!({"site_name": "Quire"})),
            ))
            .await
            .unwrap();

        let doc = executor
            .execute(Operation::FindGlobal(OperationArgs::new("settings")))
            .await
            .unwrap();
        assert_eq!(doc["site_name"], "Quire");
    }
}
