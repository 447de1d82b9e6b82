//! CLI command implementations
//!
//! Every command loads and validates the configuration first; nothing
//! binds a socket until the whole schema is known to be sound.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::config::QuireConfig;
use crate::http_server::HttpServer;

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Configuration written by `quire init`
const STARTER_CONFIG: &str = r#"{
  "server": { "host": "127.0.0.1", "port": 3000 },
  "localization": { "locales": ["en"], "default_locale": "en" },
  "auth": { "secret": "change-me" },
  "default_depth": 0,
  "max_depth": 10,
  "collections": [
    {
      "slug": "users",
      "auth": true,
      "use_as_title": "email",
      "fields": [{ "name": "name", "type": "text" }],
      "access": { "create": "public" }
    },
    {
      "slug": "posts",
      "use_as_title": "title",
      "fields": [
        { "name": "title", "type": "text", "required": true, "localized": true },
        { "name": "author", "type": "relationship", "relation_to": "users" }
      ]
    }
  ],
  "globals": [
    { "slug": "settings", "fields": [{ "name": "site_name", "type": "text", "localized": true }] }
  ]
}
"#;

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Check { config } => check(&config).map(|summary| {
            println!("{}", summary);
        }),
        Command::Serve { config, port } => serve(&config, port),
    }
}

/// Write a starter configuration; refuses to overwrite an existing file
pub fn init(config_path: &Path) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::already_initialized(config_path));
    }
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(config_path, STARTER_CONFIG)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

/// Validate a configuration and summarize what it declares
pub fn check(config_path: &Path) -> CliResult<Value> {
    let config = QuireConfig::load(config_path)?;

    let collections: Vec<Value> = config
        .collections
        .iter()
        .map(|c| {
            json!({
                "slug": c.slug,
                "fields": c.fields.len(),
                "auth": c.auth,
                "localized": c.has_localized_fields(),
            })
        })
        .collect();
    let globals: Vec<&str> = config.globals.iter().map(|g| g.slug.as_str()).collect();

    Ok(json!({
        "status": "ok",
        "collections": collections,
        "globals": globals,
        "locales": config.localization.as_ref().map(|l| l.locales.clone()),
    }))
}

/// Boot the REST server and serve until stopped
pub fn serve(config_path: &Path, port: Option<u16>) -> CliResult<()> {
    crate::logging::init();

    let config = QuireConfig::load(config_path)?;
    let api = Arc::new(config.build()?);

    let mut http_config = config.server.clone();
    if let Some(port) = port {
        http_config.port = port;
    }

    tracing::info!(
        config = %config_path.display(),
        collections = config.collections.len(),
        globals = config.globals.len(),
        "configuration loaded"
    );

    let server = HttpServer::new(http_config, api);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::serve_failed(format!("Failed to create tokio runtime: {}", e)))?;

    rt.block_on(async {
        server
            .start()
            .await
            .map_err(|e| CliError::serve_failed(format!("HTTP server failed: {}", e)))
    })
}
