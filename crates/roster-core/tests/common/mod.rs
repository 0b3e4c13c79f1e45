//! Test doubles and common utilities for contract tests
//!
//! These doubles script directory and store behavior so that the
//! reconciliation and change event contracts can be checked without a
//! network or a disk.

#![allow(dead_code)]

use roster_core::error::{Error, Result};
use roster_core::{DirectoryMember, DirectoryProfile, Member, MemberLister, MemberStore, MemoryMemberStore, SyncConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A directory that fails a fixed number of times, then returns its listing
pub struct ScriptedLister {
    listing: Vec<DirectoryMember>,
    failures_left: AtomicUsize,
    calls: Arc<AtomicUsize>,
}

impl ScriptedLister {
    pub fn new(listing: Vec<DirectoryMember>) -> Self {
        Self::failing_first(0, listing)
    }

    /// Fail the first `failures` calls with a transient error
    pub fn failing_first(failures: usize, listing: Vec<DirectoryMember>) -> Self {
        Self {
            listing,
            failures_left: AtomicUsize::new(failures),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared call counter, readable after the lister is moved into an Arc
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl MemberLister for ScriptedLister {
    async fn list_members(&self) -> Result<Vec<DirectoryMember>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::directory("scripted", "directory unavailable"));
        }

        Ok(self.listing.clone())
    }

    fn directory_name(&self) -> &'static str {
        "scripted"
    }
}

/// A directory that takes `delay` to answer
pub struct SlowLister {
    delay: Duration,
    listing: Vec<DirectoryMember>,
    calls: Arc<AtomicUsize>,
}

impl SlowLister {
    pub fn new(delay: Duration, listing: Vec<DirectoryMember>) -> Self {
        Self {
            delay,
            listing,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait::async_trait]
impl MemberLister for SlowLister {
    async fn list_members(&self) -> Result<Vec<DirectoryMember>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.listing.clone())
    }

    fn directory_name(&self) -> &'static str {
        "slow"
    }
}

/// A memory store that counts writes and can reject the first bulk writes
#[derive(Clone)]
pub struct RecordingStore {
    inner: MemoryMemberStore,
    bulk_failures_left: Arc<AtomicUsize>,
    bulk_attempts: Arc<AtomicUsize>,
    bulk_commits: Arc<AtomicUsize>,
    single_commits: Arc<AtomicUsize>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::failing_first(0)
    }

    /// Reject the first `failures` bulk writes with a store error
    pub fn failing_first(failures: usize) -> Self {
        Self {
            inner: MemoryMemberStore::new(),
            bulk_failures_left: Arc::new(AtomicUsize::new(failures)),
            bulk_attempts: Arc::new(AtomicUsize::new(0)),
            bulk_commits: Arc::new(AtomicUsize::new(0)),
            single_commits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of bulk writes attempted
    pub fn bulk_attempts(&self) -> usize {
        self.bulk_attempts.load(Ordering::SeqCst)
    }

    /// Number of bulk writes that succeeded
    pub fn bulk_commits(&self) -> usize {
        self.bulk_commits.load(Ordering::SeqCst)
    }

    /// Number of single-record writes that succeeded
    pub fn single_commits(&self) -> usize {
        self.single_commits.load(Ordering::SeqCst)
    }

    pub async fn get(&self, id: &str) -> Option<Member> {
        self.inner.get(id).await
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

#[async_trait::async_trait]
impl MemberStore for RecordingStore {
    async fn upsert_members(&self, members: &[Member]) -> Result<()> {
        self.bulk_attempts.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .bulk_failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::store("connection reset"));
        }

        self.inner.upsert_members(members).await?;
        self.bulk_commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_member(&self, member: &Member) -> Result<()> {
        self.inner.upsert_member(member).await?;
        self.single_commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Member>> {
        self.inner.list_all().await
    }
}

/// A memory store whose single-record writes take `delay` to land
#[derive(Clone)]
pub struct SlowStore {
    inner: MemoryMemberStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryMemberStore::new(),
            delay,
        }
    }

    pub async fn get(&self, id: &str) -> Option<Member> {
        self.inner.get(id).await
    }
}

#[async_trait::async_trait]
impl MemberStore for SlowStore {
    async fn upsert_members(&self, members: &[Member]) -> Result<()> {
        self.inner.upsert_members(members).await
    }

    async fn upsert_member(&self, member: &Member) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.inner.upsert_member(member).await
    }

    async fn list_all(&self) -> Result<Vec<Member>> {
        self.inner.list_all().await
    }
}

/// A directory member as the list endpoint would return it
pub fn directory_member(id: &str, name: &str, status_text: &str) -> DirectoryMember {
    DirectoryMember {
        id: id.to_string(),
        name: name.to_string(),
        real_name: format!("{} (real)", name),
        tz: "Europe/Berlin".to_string(),
        profile: DirectoryProfile {
            status_text: status_text.to_string(),
            ..DirectoryProfile::default()
        },
        ..DirectoryMember::default()
    }
}

/// Three members: U1, U2, U3
pub fn sample_listing() -> Vec<DirectoryMember> {
    vec![
        directory_member("U1", "ada", "coding"),
        directory_member("U2", "grace", ""),
        directory_member("U3", "linus", "on leave"),
    ]
}

/// Sync settings with millisecond-scale delays
pub fn fast_sync_config() -> SyncConfig {
    SyncConfig {
        fetch_timeout_ms: 1_000,
        retry_base_delay_ms: 10,
        retry_jitter_ms: 10,
        event_channel_capacity: 64,
    }
}

/// Serialize a member change envelope
pub fn member_change_envelope(token: &str, member: &DirectoryMember) -> Vec<u8> {
    serde_json::json!({
        "token": token,
        "type": "event_callback",
        "event": {"type": "member_change", "user": member}
    })
    .to_string()
    .into_bytes()
}
