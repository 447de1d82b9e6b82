//! # Configuration
//!
//! `quire.json` describes the server, localization, auth and every
//! collection and global. Loading validates the whole file up front so a
//! bad schema fails at boot, never mid-request.
//!
//! ```json
//! {
//!   "server": { "port": 3000 },
//!   "localization": { "locales": ["en", "es"], "default_locale": "en" },
//!   "auth": { "secret": "change-me" },
//!   "collections": [
//!     { "slug": "posts", "fields": [{ "name": "title", "type": "text", "localized": true }] }
//!   ],
//!   "globals": []
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{EmailSender, JwtConfig, JwtManager, LogEmailSender, ResetTokenStore};
use crate::core::LocalApi;
use crate::http_server::HttpServerConfig;
use crate::locale::LocalizationConfig;
use crate::registry::{Registry, DEFAULT_MAX_DEPTH};
use crate::schema::{
    has_localized_fields, CollectionSchema, Field, FieldType, GlobalSchema, SchemaCatalog,
    RESERVED_KEYS,
};
use crate::operations::OperationContext;
use crate::store::InMemoryStore;

/// Environment variable consulted when `auth.secret` is absent
pub const SECRET_ENV: &str = "QUIRE_SECRET";

const SLUG_PATTERN: &str = r"^[a-z][a-z0-9_-]*$";
const FIELD_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// Upper bound for token lifetimes: one year
pub const MAX_TTL_MINUTES: i64 = 366 * 24 * 60;

/// Collection slugs that would shadow REST routes
const RESERVED_COLLECTION_SLUGS: &[&str] = &["globals"];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid slug '{0}': must match {}", SLUG_PATTERN)]
    InvalidSlug(String),

    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("Invalid field '{field}' in {schema}: {reason}")]
    InvalidField {
        schema: String,
        field: String,
        reason: String,
    },

    #[error("Invalid localization: {0}")]
    InvalidLocalization(String),

    #[error("Authentication secret required: set auth.secret or {}", SECRET_ENV)]
    MissingSecret,

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    fn field(schema: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            schema: schema.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Config result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Token settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC signing secret; falls back to `QUIRE_SECRET`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Token lifetime in minutes (default: 120)
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,

    /// `iss` claim (default: "quire")
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Password reset token lifetime in minutes (default: 60)
    #[serde(default = "default_reset_token_ttl")]
    pub reset_token_ttl_minutes: i64,
}

fn default_token_ttl() -> i64 {
    120
}

fn default_reset_token_ttl() -> i64 {
    60
}

fn default_issuer() -> String {
    "quire".to_string()
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_minutes: default_token_ttl(),
            issuer: default_issuer(),
            reset_token_ttl_minutes: default_reset_token_ttl(),
        }
    }
}

/// Root of `quire.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuireConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub localization: Option<LocalizationConfig>,

    /// Population depth for non-REST reads (default: 0)
    #[serde(default)]
    pub default_depth: u32,

    /// Cap on REST `depth` (default: 10)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub collections: Vec<CollectionSchema>,

    #[serde(default)]
    pub globals: Vec<GlobalSchema>,
}

impl QuireConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: QuireConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Signing secret from the file or the environment
    pub fn resolved_secret(&self) -> Option<String> {
        self.auth
            .secret
            .clone()
            .or_else(|| std::env::var(SECRET_ENV).ok())
            .filter(|s| !s.is_empty())
    }

    fn has_auth_collections(&self) -> bool {
        self.collections.iter().any(|c| c.auth)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        self.validate_with_secret(self.resolved_secret().as_deref())
    }

    fn validate_with_secret(&self, secret: Option<&str>) -> ConfigResult<()> {
        let slug_re = Regex::new(SLUG_PATTERN).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let field_re =
            Regex::new(FIELD_NAME_PATTERN).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let mut collection_slugs = HashSet::new();
        for collection in &self.collections {
            check_slug(&slug_re, &collection.slug)?;
            if RESERVED_COLLECTION_SLUGS.contains(&collection.slug.as_str()) {
                return Err(ConfigError::InvalidSlug(collection.slug.clone()));
            }
            if !collection_slugs.insert(collection.slug.as_str()) {
                return Err(ConfigError::DuplicateSlug(collection.slug.clone()));
            }
        }

        let mut global_slugs = HashSet::new();
        for global in &self.globals {
            check_slug(&slug_re, &global.slug)?;
            if !global_slugs.insert(global.slug.as_str()) {
                return Err(ConfigError::DuplicateSlug(global.slug.clone()));
            }
        }

        let checker = FieldChecker {
            field_re: &field_re,
            slug_re: &slug_re,
            collections: &collection_slugs,
        };
        for collection in &self.collections {
            checker.check(&collection.slug, &collection.fields)?;
            if let Some(title) = &collection.use_as_title {
                if !collection.fields.iter().any(|f| &f.name == title)
                    && !(collection.auth && title == "email")
                {
                    return Err(ConfigError::field(
                        &collection.slug,
                        title,
                        "use_as_title must name a field",
                    ));
                }
            }
        }
        for global in &self.globals {
            checker.check(&global.slug, &global.fields)?;
        }

        self.validate_localization()?;

        if self.default_depth > self.max_depth {
            return Err(ConfigError::Invalid(format!(
                "default_depth ({}) exceeds max_depth ({})",
                self.default_depth, self.max_depth
            )));
        }

        for (key, minutes) in [
            ("auth.token_ttl_minutes", self.auth.token_ttl_minutes),
            ("auth.reset_token_ttl_minutes", self.auth.reset_token_ttl_minutes),
        ] {
            ttl(key, minutes)?;
        }
        if self.has_auth_collections() && secret.is_none() {
            return Err(ConfigError::MissingSecret);
        }

        Ok(())
    }

    fn validate_localization(&self) -> ConfigResult<()> {
        let Some(localization) = &self.localization else {
            let localized = self
                .collections
                .iter()
                .map(|c| (&c.slug, &c.fields))
                .chain(self.globals.iter().map(|g| (&g.slug, &g.fields)))
                .find(|(_, fields)| has_localized_fields(fields));
            return match localized {
                Some((slug, _)) => Err(ConfigError::InvalidLocalization(format!(
                    "{} has localized fields but localization is not configured",
                    slug
                ))),
                None => Ok(()),
            };
        };

        if localization.locales.is_empty() {
            return Err(ConfigError::InvalidLocalization(
                "at least one locale is required".to_string(),
            ));
        }
        if !localization.has_locale(&localization.default_locale) {
            return Err(ConfigError::InvalidLocalization(format!(
                "default locale '{}' is not in locales",
                localization.default_locale
            )));
        }
        for reserved in [crate::locale::ALL_LOCALES, crate::locale::NO_FALLBACK] {
            if localization.has_locale(reserved) {
                return Err(ConfigError::InvalidLocalization(format!(
                    "'{}' is reserved and cannot be a locale",
                    reserved
                )));
            }
        }
        Ok(())
    }

    /// Build the registry, store and local API this configuration describes
    ///
    /// Account mail goes to the log; see [`QuireConfig::build_with_mailer`].
    pub fn build(&self) -> ConfigResult<LocalApi> {
        self.build_with_mailer(Arc::new(LogEmailSender))
    }

    /// Like [`QuireConfig::build`], delivering account mail through `mailer`
    pub fn build_with_mailer(&self, mailer: Arc<dyn EmailSender>) -> ConfigResult<LocalApi> {
        let catalog = Arc::new(SchemaCatalog::new(
            self.collections.clone(),
            self.globals.clone(),
        ));

        let mut registry = Registry::new(Arc::clone(&catalog)).with_max_depth(self.max_depth);
        if let Some(localization) = &self.localization {
            registry = registry.with_localization(localization.clone());
        }
        if let Some(secret) = self.resolved_secret() {
            registry = registry.with_jwt(JwtManager::new(JwtConfig {
                secret,
                token_ttl: ttl("auth.token_ttl_minutes", self.auth.token_ttl_minutes)?,
                issuer: self.auth.issuer.clone(),
            }));
        }

        let store = InMemoryStore::new(catalog).with_default_depth(self.default_depth);
        let reset_ttl = ttl(
            "auth.reset_token_ttl_minutes",
            self.auth.reset_token_ttl_minutes,
        )?;
        let ctx = OperationContext::new(Arc::new(registry), Arc::new(store))
            .with_reset_tokens(ResetTokenStore::new(reset_ttl))
            .with_mailer(mailer);
        Ok(LocalApi::from_context(ctx))
    }
}

/// Lifetime in minutes as a duration, within `1..=MAX_TTL_MINUTES`
fn ttl(key: &str, minutes: i64) -> ConfigResult<Duration> {
    if !(1..=MAX_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::Invalid(format!(
            "{} must be between 1 and {}",
            key, MAX_TTL_MINUTES
        )));
    }
    Duration::try_minutes(minutes)
        .ok_or_else(|| ConfigError::Invalid(format!("{} is out of range", key)))
}

fn check_slug(slug_re: &Regex, slug: &str) -> ConfigResult<()> {
    if slug_re.is_match(slug) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSlug(slug.to_string()))
    }
}

struct FieldChecker<'a> {
    field_re: &'a Regex,
    slug_re: &'a Regex,
    collections: &'a HashSet<&'a str>,
}

impl FieldChecker<'_> {
    fn check(&self, schema: &str, fields: &[Field]) -> ConfigResult<()> {
        let mut names = HashSet::new();
        for field in fields {
            if RESERVED_KEYS.contains(&field.name.as_str()) {
                return Err(ConfigError::field(schema, &field.name, "name is reserved"));
            }
            if !self.field_re.is_match(&field.name) {
                return Err(ConfigError::field(
                    schema,
                    &field.name,
                    format!("name must match {}", FIELD_NAME_PATTERN),
                ));
            }
            if !names.insert(field.name.as_str()) {
                return Err(ConfigError::field(schema, &field.name, "duplicate field name"));
            }

            match &field.field_type {
                FieldType::Relationship { relation_to, .. } => {
                    if !self.collections.contains(relation_to.as_str()) {
                        return Err(ConfigError::field(
                            schema,
                            &field.name,
                            format!("relation_to names unknown collection '{}'", relation_to),
                        ));
                    }
                }
                FieldType::Select { options, .. } if options.is_empty() => {
                    return Err(ConfigError::field(schema, &field.name, "select needs options"));
                }
                FieldType::Number {
                    min: Some(min),
                    max: Some(max),
                } if min > max => {
                    return Err(ConfigError::field(schema, &field.name, "min exceeds max"));
                }
                FieldType::Group { fields } | FieldType::Array { fields, .. } => {
                    self.check(&format!("{}.{}", schema, field.name), fields)?;
                }
                FieldType::Blocks { blocks } => {
                    let mut block_slugs = HashSet::new();
                    for block in blocks {
                        if !self.slug_re.is_match(&block.slug)
                            || !block_slugs.insert(block.slug.as_str())
                        {
                            return Err(ConfigError::field(
                                schema,
                                &field.name,
                                format!("invalid or duplicate block '{}'", block.slug),
                            ));
                        }
                        let path = format!("{}.{}.{}", schema, field.name, block.slug);
                        self.check(&path, &block.fields)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
