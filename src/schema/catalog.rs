//! Schema catalog
//!
//! In-memory lookup of collection and global schemas by slug. Built once
//! from configuration and shared read-only between the registry and the
//! store adapter.

use std::collections::HashMap;

use super::types::{CollectionSchema, GlobalSchema};

/// All schemas known to a running instance
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    collections: HashMap<String, CollectionSchema>,
    globals: HashMap<String, GlobalSchema>,
}

impl SchemaCatalog {
    /// Builds a catalog. Later entries replace earlier ones with the same slug.
    pub fn new(collections: Vec<CollectionSchema>, globals: Vec<GlobalSchema>) -> Self {
        let collections = collections
            .into_iter()
            .map(|c| {
                let c = c.normalize();
                (c.slug.clone(), c)
            })
            .collect();
        let globals = globals.into_iter().map(|g| (g.slug.clone(), g)).collect();

        Self {
            collections,
            globals,
        }
    }

    pub fn collection(&self, slug: &str) -> Option<&CollectionSchema> {
        self.collections.get(slug)
    }

    pub fn global(&self, slug: &str) -> Option<&GlobalSchema> {
        self.globals.get(slug)
    }

    pub fn collections(&self) -> impl Iterator<Item = &CollectionSchema> {
        self.collections.values()
    }

    pub fn globals(&self) -> impl Iterator<Item = &GlobalSchema> {
        self.globals.values()
    }

    /// Whether any collection holds login-capable users
    pub fn has_auth_collections(&self) -> bool {
        self.collections.values().any(|c| c.auth)
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn global_count(&self) -> usize {
        self.globals.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{find_field, Field};

    #[test]
    fn test_lookup() {
        let catalog = SchemaCatalog::new(
            vec![CollectionSchema::new("posts", vec![Field::text("title")])],
            vec![GlobalSchema::new("settings", vec![Field::text("site_name")])],
        );

        assert!(catalog.collection("posts").is_some());
        assert!(catalog.collection("settings").is_none());
        assert!(catalog.global("settings").is_some());
        assert_eq!(catalog.collection_count(), 1);
        assert_eq!(catalog.global_count(), 1);
        assert!(!catalog.has_auth_collections());
    }

    #[test]
    fn test_auth_collections_are_normalized() {
        let catalog = SchemaCatalog::new(
            vec![CollectionSchema::new("users", vec![]).with_auth()],
            vec![],
        );

        let users = catalog.collection("users").unwrap();
        assert!(find_field(&users.fields, "email").is_some());
        assert!(find_field(&users.fields, "hash").unwrap().hidden);
        assert!(catalog.has_auth_collections());
    }
}
