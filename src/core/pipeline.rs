//! Execution Pipeline
//!
//! Middleware chain wrapped around the operation executor.
//! Middleware sees every operation; the executor runs the fixed
//! policy → hook → store → serialize → hook stages.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde_json::Value;

use super::error::CmsResult;
use super::middleware::Middleware;
use super::operation::Operation;

/// Result of an operation
pub type OperationResult = CmsResult<Value>;

/// Next middleware in chain
pub struct Next<'a> {
    middleware: &'a [Arc<dyn Middleware>],
    executor: &'a dyn OperationExecutor,
}

impl<'a> Next<'a> {
    /// Run the next middleware or executor
    pub fn run(self, op: Operation) -> BoxFuture<'a, OperationResult> {
        Box::pin(async move {
            if let Some((first, rest)) = self.middleware.split_first() {
                let next = Next {
                    middleware: rest,
                    executor: self.executor,
                };
                first.process(op, next).await
            } else {
                // End of middleware chain, execute operation
                self.executor.execute(op).await
            }
        })
    }
}

/// Operation executor (final stage of pipeline)
pub trait OperationExecutor: Send + Sync {
    /// Execute the operation
    fn execute(&self, op: Operation) -> BoxFuture<'_, OperationResult>;
}

/// The unified execution pipeline
pub struct Pipeline {
    middleware: Vec<Arc<dyn Middleware>>,
    executor: Arc<dyn OperationExecutor>,
}

impl Pipeline {
    /// Create a new pipeline with the given executor
    pub fn new(executor: impl OperationExecutor + 'static) -> Self {
        Self {
            middleware: Vec::new(),
            executor: Arc::new(executor),
        }
    }

    /// Add middleware to the pipeline
    pub fn with_middleware(mut self, m: impl Middleware + 'static) -> Self {
        self.middleware.push(Arc::new(m));
        self
    }

    /// Execute an operation through the pipeline
    pub async fn execute(&self, op: Operation) -> OperationResult {
        let next = Next {
            middleware: &self.middleware,
            executor: self.executor.as_ref(),
        };
        next.run(op).await
    }

    /// Get the number of middleware stages
    pub fn middleware_count(&self) -> usize {
        self.middleware.len()
    }
}
