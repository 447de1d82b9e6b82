//! # Quire HTTP Server Module
//!
//! Axum server exposing the operation pipeline over REST.
//!
//! # Endpoints
//!
//! - `/health` - Health check with operation counters
//! - `/api/globals/:slug` - Read and write globals
//! - `/api/:collection[/:id]` - Collection CRUD
//! - `/api/:collection/login`, `/api/:collection/me` - Authentication

pub mod config;
pub mod errors;
pub mod params;
pub mod routes;
pub mod server;

pub use config::HttpServerConfig;
pub use errors::ErrorResponse;
pub use params::QueryParams;
pub use routes::{api_routes, ApiState};
pub use server::HttpServer;
