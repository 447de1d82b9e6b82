//! Middleware Traits and Implementations
//!
//! Middleware stages for the execution pipeline.

use futures_util::future::BoxFuture;

use super::operation::Operation;
use super::pipeline::{Next, OperationResult};

/// Middleware trait for pipeline stages
pub trait Middleware: Send + Sync {
    /// Process the operation and hand it to `next`
    fn process<'a>(&'a self, op: Operation, next: Next<'a>) -> BoxFuture<'a, OperationResult>;
}

pub mod observe;
