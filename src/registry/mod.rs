//! # Registry
//!
//! The per-instance configuration handed explicitly to every operation:
//! schemas, resolved access policies, hooks, localization and auth.
//!
//! Policies start out as the declarative rules from the schema's `access`
//! block. Code may replace them, and attach hooks, before the registry is
//! shared.

use std::collections::HashMap;
use std::sync::Arc;

use crate::access::{Access, Policy};
use crate::auth::JwtManager;
use crate::core::error::{CmsError, CmsResult};
use crate::hooks::Hooks;
use crate::locale::LocalizationConfig;
use crate::schema::{CollectionSchema, GlobalSchema, SchemaCatalog};

/// Default cap on REST population depth
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// A collection with its policies and hooks
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub schema: CollectionSchema,
    pub access: Access,
    pub hooks: Hooks,
}

/// A global with its policies and hooks
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub schema: GlobalSchema,
    pub access: Access,
    pub hooks: Hooks,
}

/// Which operation a policy override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Create,
    Read,
    Update,
    Delete,
}

impl Access {
    fn set(&mut self, kind: AccessKind, policy: Arc<dyn Policy>) {
        let slot = match kind {
            AccessKind::Create => &mut self.create,
            AccessKind::Read => &mut self.read,
            AccessKind::Update => &mut self.update,
            AccessKind::Delete => &mut self.delete,
        };
        *slot = Some(policy);
    }
}

/// Configuration for all collections and globals
pub struct Registry {
    catalog: Arc<SchemaCatalog>,
    collections: HashMap<String, CollectionConfig>,
    globals: HashMap<String, GlobalConfig>,
    localization: Option<LocalizationConfig>,
    max_depth: u32,
    jwt: Option<Arc<JwtManager>>,
}

impl Registry {
    /// Build from a catalog, resolving declarative access rules
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        let collections = catalog
            .collections()
            .map(|schema| {
                let config = CollectionConfig {
                    access: Access::from_config(&schema.access),
                    schema: schema.clone(),
                    hooks: Hooks::default(),
                };
                (schema.slug.clone(), config)
            })
            .collect();

        let globals = catalog
            .globals()
            .map(|schema| {
                let config = GlobalConfig {
                    access: Access::from_config(&schema.access),
                    schema: schema.clone(),
                    hooks: Hooks::default(),
                };
                (schema.slug.clone(), config)
            })
            .collect();

        Self {
            catalog,
            collections,
            globals,
            localization: None,
            max_depth: DEFAULT_MAX_DEPTH,
            jwt: None,
        }
    }

    pub fn with_localization(mut self, localization: LocalizationConfig) -> Self {
        self.localization = Some(localization);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_jwt(mut self, jwt: JwtManager) -> Self {
        self.jwt = Some(Arc::new(jwt));
        self
    }

    /// Attach hooks to a collection
    ///
    /// # Errors
    ///
    /// `UnknownCollection` when the slug is not configured.
    pub fn with_collection_hooks(mut self, slug: &str, hooks: Hooks) -> CmsResult<Self> {
        self.collection_mut(slug)?.hooks = hooks;
        Ok(self)
    }

    /// Attach hooks to a global
    pub fn with_global_hooks(mut self, slug: &str, hooks: Hooks) -> CmsResult<Self> {
        self.global_mut(slug)?.hooks = hooks;
        Ok(self)
    }

    /// Replace one of a collection's policies
    pub fn with_collection_policy(
        mut self,
        slug: &str,
        kind: AccessKind,
        policy: Arc<dyn Policy>,
    ) -> CmsResult<Self> {
        self.collection_mut(slug)?.access.set(kind, policy);
        Ok(self)
    }

    /// Replace one of a global's policies
    pub fn with_global_policy(
        mut self,
        slug: &str,
        kind: AccessKind,
        policy: Arc<dyn Policy>,
    ) -> CmsResult<Self> {
        self.global_mut(slug)?.access.set(kind, policy);
        Ok(self)
    }

    pub fn collection(&self, slug: &str) -> CmsResult<&CollectionConfig> {
        self.collections
            .get(slug)
            .ok_or_else(|| CmsError::UnknownCollection(slug.to_string()))
    }

    pub fn global(&self, slug: &str) -> CmsResult<&GlobalConfig> {
        self.globals
            .get(slug)
            .ok_or_else(|| CmsError::UnknownGlobal(slug.to_string()))
    }

    fn collection_mut(&mut self, slug: &str) -> CmsResult<&mut CollectionConfig> {
        self.collections
            .get_mut(slug)
            .ok_or_else(|| CmsError::UnknownCollection(slug.to_string()))
    }

    fn global_mut(&mut self, slug: &str) -> CmsResult<&mut GlobalConfig> {
        self.globals
            .get_mut(slug)
            .ok_or_else(|| CmsError::UnknownGlobal(slug.to_string()))
    }

    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    pub fn localization(&self) -> Option<&LocalizationConfig> {
        self.localization.as_ref()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn jwt(&self) -> Option<&JwtManager> {
        self.jwt.as_deref()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("collections", &self.collections.keys().collect::<Vec<_>>())
            .field("globals", &self.globals.keys().collect::<Vec<_>>())
            .field("localization", &self.localization)
            .field("max_depth", &self.max_depth)
            .field("jwt", &self.jwt.is_some())
            .finish()
    }
}
