// # roster-core
//
// Core library for the directory membership sync service.
//
// ## Architecture Overview
//
// This library keeps a local copy of a team directory's members current:
// - **MemberLister**: Trait for fetching the full member list from a directory
// - **MemberStore**: Trait for bulk and single-record member upserts
// - **Reconciler**: Startup loop that retries until one full snapshot lands
// - **ChangeEventProcessor**: Applies webhook change events one member at a time
// - **mapping**: Pure conversion from directory members to storage records
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Sync logic is separate from the directory client and HTTP surface
// 2. **Snapshot, then deltas**: One reconciliation at startup, change events after that
// 3. **Library-First**: The daemon is a thin shell over this crate
// 4. **Idempotency**: Every write is an upsert keyed by member id

pub mod traits;
pub mod member;
pub mod mapping;
pub mod reconcile;
pub mod change_event;
pub mod config;
pub mod error;
pub mod store;

// Re-export core types for convenience
pub use traits::{MemberLister, MemberStore};
pub use member::{DirectoryMember, DirectoryProfile, Member};
pub use reconcile::{ReconcileOutcome, Reconciler, SyncEvent};
pub use change_event::{ChangeEvent, ChangeEventProcessor, ChangeOutcome, Envelope};
pub use config::{DirectoryConfig, RosterConfig, StoreConfig, SyncConfig, WebhookConfig};
pub use error::{Error, Result};
pub use store::{FileMemberStore, MemoryMemberStore};
