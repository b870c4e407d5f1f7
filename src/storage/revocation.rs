//! Token revocation storage
//!
//! Holds tokens that were explicitly logged out before their natural
//! expiry. A token absent from this set may still be invalid (bad
//! signature, expired); presence here only rejects it early.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;

/// Revocation set interface
///
/// Implementations must be safe under concurrent lookups and inserts.
/// Production deployments that run more than one process should back this
/// with a shared external store (e.g. a cache with native TTL support);
/// the in-memory implementation below loses its contents on restart,
/// which effectively un-revokes unexpired logged-out tokens. That is an
/// accepted limitation of single-process deployments.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a token as revoked until its natural expiry
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Check membership. Entries whose expiry has passed are removed on
    /// lookup and reported as not revoked; the expiry check on the token
    /// itself already rejects them.
    async fn is_revoked(&self, token: &str) -> Result<bool>;

    /// Number of live entries (revoked and not yet expired)
    async fn len(&self) -> Result<usize>;
}

/// Shared reference to a revocation store
pub type SharedRevocationStore = Arc<dyn RevocationStore>;

/// In-memory revocation set
///
/// Growth is bounded by lazy eviction: every lookup that hits an expired
/// entry deletes it, so the set never outlives the tokens it rejects.
pub struct MemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl MemoryRevocationStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryRevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RevocationStore for MemoryRevocationStore {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(token.to_string(), expires_at);
        log::debug!("Revocation recorded, {} live entries", entries.len());
        Ok(())
    }

    async fn is_revoked(&self, token: &str) -> Result<bool> {
        // Fast path: most tokens were never revoked
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                None => return Ok(false),
                Some(expiry) if *expiry > Utc::now() => return Ok(true),
                Some(_) => {} // expired entry, fall through to evict
            }
        }

        // Re-check under the write lock; another lookup may have evicted
        let mut entries = self.entries.write().await;
        match entries.get(token) {
            Some(expiry) if *expiry <= Utc::now() => {
                entries.remove(token);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }
}

/// Create a new memory-based revocation store
pub fn create_memory_revocation_store() -> SharedRevocationStore {
    Arc::new(MemoryRevocationStore::new())
}
