//! # HTTP Server
//!
//! Main HTTP server combining the health check and the REST API.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::core::{LocalApi, StatsSnapshot};

use super::config::HttpServerConfig;
use super::routes::{api_routes, ApiState};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub collections: usize,
    pub globals: usize,
    pub operations: StatsSnapshot,
}

/// HTTP server for the CMS REST API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, api: Arc<LocalApi>) -> Self {
        let router = Self::build_router(&config, api);
        Self { config, router }
    }

    fn build_router(config: &HttpServerConfig, api: Arc<LocalApi>) -> Router {
        let origin = if config.cors_origins.is_empty() {
            AllowOrigin::any()
        } else {
            let origins = config.cors_origins.iter().filter_map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|_| tracing::warn!(origin = %s, "ignoring unparsable CORS origin"))
                    .ok()
            });
            AllowOrigin::list(origins)
        };
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any);

        let health = Router::new()
            .route("/health", get(health_handler))
            .with_state(Arc::clone(&api));

        Router::new()
            .merge(health)
            .nest("/api", api_routes(ApiState::new(api)))
            .layer(DefaultBodyLimit::max(config.body_limit_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Consume the server, returning its router
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process is stopped
    pub async fn start(self) -> std::io::Result<()> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "quire listening");
        tracing::info!("REST API available at http://{}/api", addr);

        axum::serve(listener, self.router).await
    }
}

async fn health_handler(State(api): State<Arc<LocalApi>>) -> impl IntoResponse {
    let catalog = api.registry().catalog();
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        collections: catalog.collection_count(),
        globals: catalog.global_count(),
        operations: api.stats(),
    };

    (StatusCode::OK, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::test_support::context;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn server(port: u16) -> HttpServer {
        HttpServer::new(
            HttpServerConfig::with_port(port),
            Arc::new(LocalApi::from_context(context())),
        )
    }

    #[test]
    fn test_socket_addr() {
        assert_eq!(server(8080).socket_addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_health() {
        let response = server(3000)
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["collections"], 3);
        assert_eq!(json["globals"], 1);
        assert_eq!(json["operations"]["succeeded"], 0);
    }
}
