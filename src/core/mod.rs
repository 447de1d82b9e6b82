//! # Quire Core Module
//!
//! Unified abstractions for operation execution: the operation model,
//! the middleware pipeline and the executor that drives the orchestrated
//! CRUD operations.
//!
//! ## Design Principles
//!
//! - Single operation model for globals and collections
//! - Middleware-based execution pipeline
//! - Errors pass through every stage unchanged

pub mod context;
pub mod error;
pub mod executor;
pub mod local_api;
pub mod middleware;
pub mod operation;
pub mod pipeline;

pub use context::{Api, OperationArgs};
pub use error::{CmsError, CmsResult};
pub use executor::CmsExecutor;
pub use local_api::LocalApi;
pub use middleware::observe::{ObserveMiddleware, OperationStats, StatsSnapshot};
pub use middleware::Middleware;
pub use operation::Operation;
pub use pipeline::{Next, OperationExecutor, OperationResult, Pipeline};
