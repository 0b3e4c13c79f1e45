// # Member Store Trait
//
// Defines the interface for member persistence.
//
// ## Purpose
//
// The member store is the only shared mutable state of the service. Two
// writers converge on it:
// - The reconciler, with one bulk upsert per attempt
// - The change-event processor, with one single upsert per event
//
// ## Implementations
//
// - In-memory: `MemoryMemberStore`
// - File-based: `FileMemberStore` (JSON with atomic writes)
//
// ## Usage
//
// ```rust
// use roster_core::{Member, MemberStore, MemoryMemberStore};
//
// #[tokio::main]
// async fn main() -> roster_core::Result<()> {
//     let store = MemoryMemberStore::new();
//
//     store.upsert_member(&Member::new("U1")).await?;
//     assert_eq!(store.list_all().await?.len(), 1);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::member::Member;

/// Trait for member store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks. The
/// core does no locking of its own above the store.
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O for persistent storage
/// - ✅ Implement locking/concurrency control for thread safety
///
/// ## Forbidden Capabilities
/// - ❌ Decide when to sync (owned by `Reconciler`)
/// - ❌ Talk to the directory service (owned by `MemberLister`)
/// - ❌ Delete members (the `deleted` flag preserves history)
#[async_trait]
pub trait MemberStore: Send + Sync {
    /// Insert or fully overwrite a batch of members
    ///
    /// All-or-nothing: either every record is applied or none is. If an id
    /// appears more than once in the batch, the later record wins.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Every record applied
    /// - `Err(Error)`: Nothing applied
    async fn upsert_members(&self, members: &[Member]) -> Result<(), crate::Error>;

    /// Insert a member if absent, otherwise overwrite every field
    async fn upsert_member(&self, member: &Member) -> Result<(), crate::Error>;

    /// List every stored member
    ///
    /// Ordering is unspecified; sorting is a presentation concern.
    async fn list_all(&self) -> Result<Vec<Member>, crate::Error>;
}
