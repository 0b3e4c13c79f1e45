// # Memory Member Store
//
// In-memory implementation of MemberStore.
//
// ## Purpose
//
// Provides a fast store that doesn't persist across restarts. The
// reconciler repopulates it from the directory on every start, so this is a
// reasonable production choice when history across restarts doesn't matter.
//
// ## Atomicity
//
// A batch is validated in full before the write lock is taken, and applied
// under a single write lock, so readers never observe half a batch.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::member::Member;
use crate::traits::MemberStore;
use crate::Error;

/// In-memory member store implementation
///
/// This implementation stores all members in a HashMap protected by a RwLock.
/// Clones share the same underlying map.
///
/// # Example
///
/// ```rust,no_run
/// use roster_core::store::MemoryMemberStore;
/// use roster_core::{Member, MemberStore};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryMemberStore::new();
///
///     store.upsert_member(&Member::new("U1")).await?;
///     assert_eq!(store.get("U1").await.map(|m| m.id), Some("U1".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryMemberStore {
    inner: Arc<RwLock<HashMap<String, Member>>>,
}

impl MemoryMemberStore {
    /// Create a new empty memory member store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get a single member by id
    pub async fn get(&self, id: &str) -> Option<Member> {
        self.inner.read().await.get(id).cloned()
    }

    /// Get the number of members in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

impl Default for MemoryMemberStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemberStore for MemoryMemberStore {
    async fn upsert_members(&self, members: &[Member]) -> Result<(), Error> {
        for member in members {
            member.validate()?;
        }

        let mut guard = self.inner.write().await;
        for member in members {
            guard.insert(member.id.clone(), member.clone());
        }
        Ok(())
    }

    async fn upsert_member(&self, member: &Member) -> Result<(), Error> {
        member.validate()?;
        let mut guard = self.inner.write().await;
        guard.insert(member.id.clone(), member.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Member>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.values().cloned().collect())
    }
}
