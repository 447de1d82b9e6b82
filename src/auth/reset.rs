//! # Password Reset Tokens
//!
//! One-time tokens handed out by the forgot-password flow. The raw token
//! only ever leaves through the mail sender; this store keeps its SHA-256
//! digest, the user it was issued for and an expiry.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::crypto::{generate_token, hash_token};

#[derive(Debug, Clone)]
struct ResetEntry {
    collection: String,
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// The user a consumed reset token belonged to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetClaim {
    pub collection: String,
    pub user_id: String,
}

/// Outstanding reset tokens keyed by digest
pub struct ResetTokenStore {
    entries: RwLock<HashMap<String, ResetEntry>>,
    ttl: Duration,
}

impl Default for ResetTokenStore {
    fn default() -> Self {
        Self::new(Duration::hours(1))
    }
}

impl ResetTokenStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, returning the raw value
    ///
    /// Earlier tokens for the same user stop working.
    pub async fn issue(&self, collection: &str, user_id: &str) -> String {
        let raw = generate_token();
        let now = Utc::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, e| {
            e.expires_at > now && !(e.collection == collection && e.user_id == user_id)
        });
        entries.insert(
            hash_token(&raw),
            ResetEntry {
                collection: collection.to_string(),
                user_id: user_id.to_string(),
                expires_at: now + self.ttl,
            },
        );
        raw
    }

    /// Redeem a token; it is removed whether or not it had expired
    pub async fn consume(&self, raw: &str) -> Option<ResetClaim> {
        let entry = self.entries.write().await.remove(&hash_token(raw))?;
        (entry.expires_at > Utc::now()).then(|| ResetClaim {
            collection: entry.collection,
            user_id: entry.user_id,
        })
    }

    /// Number of tokens not yet redeemed or purged
    pub async fn outstanding(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl std::fmt::Debug for ResetTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTokenStore")
            .field("ttl", &self.ttl)
            .finish()
    }
}
