//! Observability Middleware
//!
//! Wraps each operation in a tracing span and counts outcomes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures_util::future::BoxFuture;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::operation::Operation;
use crate::core::pipeline::{Next, OperationResult};

use super::Middleware;

/// Operation outcome counters
#[derive(Debug, Default)]
pub struct OperationStats {
    succeeded: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
}

/// Point-in-time copy of [`OperationStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub succeeded: u64,
    pub client_errors: u64,
    pub server_errors: u64,
}

impl OperationStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
        }
    }
}

/// Observability middleware
pub struct ObserveMiddleware {
    stats: Arc<OperationStats>,
}

impl ObserveMiddleware {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(OperationStats::default()),
        }
    }

    /// Share counters with another owner (e.g. the health endpoint)
    pub fn with_stats(stats: Arc<OperationStats>) -> Self {
        Self { stats }
    }

    pub fn stats(&self) -> Arc<OperationStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for ObserveMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl Middleware for ObserveMiddleware {
    fn process<'a>(&'a self, op: Operation, next: Next<'a>) -> BoxFuture<'a, OperationResult> {
        let span = tracing::info_span!(
            "operation",
            request_id = %Uuid::new_v4(),
            operation = op.name(),
            slug = op.slug(),
            api = op.api().as_str(),
        );

        Box::pin(
            async move {
                let started = Instant::now();
                let result = next.run(op).await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match &result {
                    Ok(_) => {
                        self.stats.succeeded.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(elapsed_ms, "operation completed");
                    }
                    Err(e) if e.is_client_error() => {
                        self.stats.client_errors.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(elapsed_ms, code = e.code(), error = %e, "operation rejected");
                    }
                    Err(e) => {
                        self.stats.server_errors.fetch_add(1, Ordering::Relaxed);
                        tracing::error!(elapsed_ms, code = e.code(), error = %e, "operation failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
