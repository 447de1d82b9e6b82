//! Operation context

use std::sync::Arc;

use crate::auth::{EmailSender, LogEmailSender, ResetTokenStore};
use crate::registry::Registry;
use crate::store::DocumentStore;

/// What every operation runs against: configuration plus the store
///
/// Auth flows also reach the outstanding reset tokens and the sender that
/// delivers them.
#[derive(Clone)]
pub struct OperationContext {
    pub registry: Arc<Registry>,
    pub store: Arc<dyn DocumentStore>,
    pub reset_tokens: Arc<ResetTokenStore>,
    pub mailer: Arc<dyn EmailSender>,
}

impl OperationContext {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            registry,
            store,
            reset_tokens: Arc::new(ResetTokenStore::default()),
            mailer: Arc::new(LogEmailSender),
        }
    }

    pub fn with_reset_tokens(mut self, reset_tokens: ResetTokenStore) -> Self {
        self.reset_tokens = Arc::new(reset_tokens);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn EmailSender>) -> Self {
        self.mailer = mailer;
        self
    }
}
