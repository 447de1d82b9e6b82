//! Access control
//!
//! A policy is a predicate over the (possibly anonymous) caller. Each
//! collection and global carries one optional policy per operation kind.
//! No policy means the operation is permitted; a policy that answers
//! `false` aborts the operation with `Forbidden` before the store is touched.
//!
//! Policies come from two places:
//! - declarative [`AccessRule`]s in the configuration file
//! - code, via [`policy_fn`] / [`async_policy_fn`] or a custom [`Policy`] impl

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::auth::User;
use crate::core::error::{CmsError, CmsResult};

/// Access predicate evaluated once per request
pub trait Policy: Send + Sync {
    /// Decide whether `user` may perform the operation
    fn evaluate<'a>(&'a self, user: Option<&'a User>) -> BoxFuture<'a, CmsResult<bool>>;
}

/// Synchronous closure policy
pub struct PolicyFn<F>(F);

impl<F> Policy for PolicyFn<F>
where
    F: Fn(Option<&User>) -> bool + Send + Sync,
{
    fn evaluate<'a>(&'a self, user: Option<&'a User>) -> BoxFuture<'a, CmsResult<bool>> {
        let allowed = (self.0)(user);
        Box::pin(async move { Ok(allowed) })
    }
}

/// Wrap a synchronous predicate as a policy
pub fn policy_fn<F>(f: F) -> Arc<dyn Policy>
where
    F: Fn(Option<&User>) -> bool + Send + Sync + 'static,
{
    Arc::new(PolicyFn(f))
}

/// Asynchronous closure policy; receives an owned copy of the user
pub struct AsyncPolicyFn<F>(F);

impl<F, Fut> Policy for AsyncPolicyFn<F>
where
    F: Fn(Option<User>) -> Fut + Send + Sync,
    Fut: Future<Output = CmsResult<bool>> + Send + 'static,
{
    fn evaluate<'a>(&'a self, user: Option<&'a User>) -> BoxFuture<'a, CmsResult<bool>> {
        Box::pin((self.0)(user.cloned()))
    }
}

/// Wrap an async predicate as a policy
pub fn async_policy_fn<F, Fut>(f: F) -> Arc<dyn Policy>
where
    F: Fn(Option<User>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CmsResult<bool>> + Send + 'static,
{
    Arc::new(AsyncPolicyFn(f))
}

/// Declarative rule usable from configuration
///
/// JSON forms: `"public"`, `"authenticated"`, `"deny"`, `{"role": "admin"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessRule {
    /// Anyone, including anonymous callers
    Public,
    /// Any logged-in user
    Authenticated,
    /// Nobody through the pipeline
    Deny,
    /// Users holding the role
    Role(String),
}

impl AccessRule {
    pub fn allows(&self, user: Option<&User>) -> bool {
        match self {
            AccessRule::Public => true,
            AccessRule::Authenticated => user.is_some(),
            AccessRule::Deny => false,
            AccessRule::Role(role) => user.map(|u| u.has_role(role)).unwrap_or(false),
        }
    }
}

impl Policy for AccessRule {
    fn evaluate<'a>(&'a self, user: Option<&'a User>) -> BoxFuture<'a, CmsResult<bool>> {
        let allowed = self.allows(user);
        Box::pin(async move { Ok(allowed) })
    }
}

/// Per-operation rules as declared in configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<AccessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<AccessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<AccessRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<AccessRule>,
}

/// Resolved policy slots for a collection or global
#[derive(Clone, Default)]
pub struct Access {
    pub create: Option<Arc<dyn Policy>>,
    pub read: Option<Arc<dyn Policy>>,
    pub update: Option<Arc<dyn Policy>>,
    pub delete: Option<Arc<dyn Policy>>,
}

impl Access {
    /// Turn declarative rules into policy slots
    pub fn from_config(config: &AccessConfig) -> Self {
        let slot =
            |rule: &Option<AccessRule>| rule.clone().map(|r| Arc::new(r) as Arc<dyn Policy>);

        Self {
            create: slot(&config.create),
            read: slot(&config.read),
            update: slot(&config.update),
            delete: slot(&config.delete),
        }
    }
}

impl std::fmt::Debug for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Access")
            .field("create", &self.create.is_some())
            .field("read", &self.read.is_some())
            .field("update", &self.update.is_some())
            .field("delete", &self.delete.is_some())
            .finish()
    }
}

/// Evaluate an optional policy
///
/// # Errors
///
/// `Forbidden` when the policy denies. Errors raised by the policy itself
/// propagate unchanged.
pub async fn execute_policy(user: Option<&User>, policy: Option<&Arc<dyn Policy>>) -> CmsResult<()> {
    let Some(policy) = policy else {
        return Ok(());
    };

    if policy.evaluate(user).await? {
        Ok(())
    } else {
        tracing::debug!(user = user.map(|u| u.id.as_str()), "access denied by policy");
        Err(CmsError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> User {
        User::new("u1", "ed@example.com", "users").with_roles(["editor"])
    }

    #[tokio::test]
    async fn test_missing_policy_permits() {
        assert!(execute_policy(None, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_denying_policy_is_forbidden() {
        let policy = policy_fn(|_| false);
        let result = execute_policy(Some(&editor()), Some(&policy)).await;
        assert!(matches!(result, Err(CmsError::Forbidden)));
    }

    #[tokio::test]
    async fn test_sync_policy_sees_user() {
        let policy = policy_fn(|user| user.map(|u| u.has_role("editor")).unwrap_or(false));
        assert!(execute_policy(Some(&editor()), Some(&policy)).await.is_ok());
        assert!(execute_policy(None, Some(&policy)).await.is_err());
    }

    #[tokio::test]
    async fn test_async_policy() {
        let policy = async_policy_fn(|user: Option<User>| async move { Ok::<_, CmsError>(user.is_some()) });
        assert!(execute_policy(Some(&editor()), Some(&policy)).await.is_ok());
        assert!(matches!(
            execute_policy(None, Some(&policy)).await,
            Err(CmsError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_policy_error_propagates_unchanged() {
        let policy =
            async_policy_fn(|_| async { Err::<bool, _>(CmsError::hook_with_status("lookup failed", 503)) });
        let err = execute_policy(None, Some(&policy)).await.unwrap_err();
        assert_eq!(err.status_code(), 503);
        assert_eq!(err.to_string(), "lookup failed");
    }

    #[test]
    fn test_rule_json_forms() {
        let config: AccessConfig = serde_json::from_value(serde_json::json!({
            "read": "public",
            "create": "authenticated",
            "update": {"role": "editor"},
            "delete": "deny"
        }))
        .unwrap();

        assert_eq!(config.read, Some(AccessRule::Public));
        assert_eq!(config.create, Some(AccessRule::Authenticated));
        assert_eq!(config.update, Some(AccessRule::Role("editor".into())));
        assert_eq!(config.delete, Some(AccessRule::Deny));
    }

    #[test]
    fn test_rule_semantics() {
        let user = editor();
        assert!(AccessRule::Public.allows(None));
        assert!(!AccessRule::Authenticated.allows(None));
        assert!(AccessRule::Authenticated.allows(Some(&user)));
        assert!(AccessRule::Role("editor".into()).allows(Some(&user)));
        assert!(!AccessRule::Role("admin".into()).allows(Some(&user)));
        assert!(!AccessRule::Deny.allows(Some(&user)));
    }

    #[test]
    fn test_access_from_config() {
        let access = Access::from_config(&AccessConfig {
            read: Some(AccessRule::Public),
            ..Default::default()
        });
        assert!(access.read.is_some());
        assert!(access.create.is_none());
    }
}
