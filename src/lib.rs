//! quire - a schema-driven headless content API
//!
//! Every collection and global operation runs the same pipeline: access
//! policy, before hook, store fetch with locale resolution, serialization,
//! after hook. The [`core::LocalApi`] exposes it in-process and the
//! [`http_server`] module exposes it over REST.

pub mod access;
pub mod auth;
pub mod cli;
pub mod config;
pub mod core;
pub mod hooks;
pub mod http_server;
pub mod locale;
pub mod logging;
pub mod operations;
pub mod registry;
pub mod schema;
pub mod store;

pub use crate::config::QuireConfig;
pub use crate::core::{CmsError, CmsResult, LocalApi, OperationArgs};
