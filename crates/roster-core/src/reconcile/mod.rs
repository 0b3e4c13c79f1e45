//! Startup reconciliation loop
//!
//! The Reconciler is responsible for:
//! - Fetching the full member list via MemberLister
//! - Mapping it to storage records
//! - Writing it in one bulk upsert via MemberStore
//! - Retrying with jittered backoff until one attempt fully succeeds
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ MemberLister │──── Vec<DirectoryMember> ────┐
//! └──────────────┘                              │
//!                                               ▼
//!                                      ┌──────────────┐
//!                                      │  Reconciler  │
//!                                      └──────────────┘
//!                                               │
//!                     ┌─────────────────────────┼──────────────────┐
//!                     ▼                         ▼                  ▼
//!              ┌────────────┐          ┌──────────────┐     ┌────────────┐
//!              │  mapping   │          │ MemberStore  │     │   Events   │
//!              │            │          │ (bulk upsert)│     │  (notify)  │
//!              └────────────┘          └──────────────┘     └────────────┘
//! ```
//!
//! ## Attempt Flow
//!
//! 1. Fetch the listing, bounded by `fetch_timeout_ms`
//! 2. Map every member
//! 3. Bulk upsert (all-or-nothing)
//! 4. On success, stop for good; change events keep data fresh afterwards
//! 5. On failure, sleep `retry_base_delay_ms` plus up to `retry_jitter_ms`
//!    and go again, with no attempt limit

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::mapping::to_member_records;
use crate::member::DirectoryMember;
use crate::traits::{MemberLister, MemberStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Reconciliation started
    Started,

    /// An attempt failed and another is scheduled
    AttemptFailed {
        attempt: usize,
        error: String,
        retry_in: Duration,
    },

    /// The store holds a full snapshot of the directory
    Completed { attempts: usize, members: usize },

    /// Stopped by a shutdown signal before any attempt succeeded
    Cancelled { attempts: usize },
}

/// How a reconciliation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// One attempt fetched and stored the full listing
    Completed { attempts: usize, members: usize },
    /// Shutdown arrived first
    Cancelled { attempts: usize },
}

/// Startup reconciliation loop
///
/// Runs once per process, off the request path. It never gives up on its
/// own: the directory or the store being briefly unavailable at startup is
/// expected, and the service keeps serving whatever the store already holds
/// in the meantime.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Start with [`Reconciler::spawn()`] (or await [`Reconciler::run()`])
/// 3. The loop ends after the first fully successful attempt
///
/// ## Randomness
///
/// The jitter source is owned by the instance. Tests pin it with
/// [`Reconciler::with_seed()`].
pub struct Reconciler {
    /// Directory client
    lister: Arc<dyn MemberLister>,

    /// Shared member store
    store: Arc<dyn MemberStore>,

    /// Time bound for one fetch
    fetch_timeout: Duration,

    /// Fixed part of the retry delay
    retry_base_delay: Duration,

    /// Upper bound of the random part of the retry delay (in milliseconds)
    retry_jitter_ms: u64,

    /// Jitter source
    rng: StdRng,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where event_receiver yields sync events
    pub fn new(
        lister: Arc<dyn MemberLister>,
        store: Arc<dyn MemberStore>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let reconciler = Self {
            lister,
            store,
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
            retry_jitter_ms: config.retry_jitter_ms,
            rng: StdRng::from_entropy(),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Replace the jitter source with a deterministic one
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Run until one attempt succeeds
    pub async fn run(self) -> ReconcileOutcome {
        self.run_internal(None).await
    }

    /// Run until one attempt succeeds or the shutdown signal fires
    ///
    /// Shutdown is honoured while fetching and while sleeping between
    /// attempts, never in the middle of a store write. A dropped sender is
    /// not a shutdown signal.
    pub async fn run_with_shutdown(
        self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> ReconcileOutcome {
        self.run_internal(shutdown_rx).await
    }

    /// Run on a new tokio task
    pub fn spawn(self) -> JoinHandle<ReconcileOutcome> {
        tokio::spawn(self.run())
    }

    async fn run_internal(
        mut self,
        shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> ReconcileOutcome {
        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(shutdown);

        self.emit_event(SyncEvent::Started);
        info!(
            "Starting member reconciliation from {}",
            self.lister.directory_name()
        );

        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!("Reconciliation attempt {}", attempts);

            let fetched = tokio::select! {
                fetched = self.fetch() => fetched,
                _ = &mut shutdown => return self.cancelled(attempts),
            };

            let result = match fetched {
                Ok(listing) => self.apply(&listing).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(members) => {
                    info!(
                        "Reconciled {} members after {} attempt(s)",
                        members, attempts
                    );
                    self.emit_event(SyncEvent::Completed { attempts, members });
                    return ReconcileOutcome::Completed { attempts, members };
                }
                Err(e) => {
                    let retry_in = self.next_delay();
                    if e.is_transient() {
                        warn!(
                            "Reconciliation attempt {} failed: {}. Retrying in {:?}",
                            attempts, e, retry_in
                        );
                    } else {
                        error!(
                            "Reconciliation attempt {} failed: {}. Retrying in {:?}",
                            attempts, e, retry_in
                        );
                    }
                    self.emit_event(SyncEvent::AttemptFailed {
                        attempt: attempts,
                        error: e.to_string(),
                        retry_in,
                    });

                    tokio::select! {
                        _ = tokio::time::sleep(retry_in) => {}
                        _ = &mut shutdown => return self.cancelled(attempts),
                    }
                }
            }
        }
    }

    /// Perform a single fetch-and-store pass
    ///
    /// # Returns
    ///
    /// The number of members written
    pub async fn attempt_once(&self) -> Result<usize> {
        let listing = self.fetch().await?;
        self.apply(&listing).await
    }

    /// Fetch the listing within the time bound
    async fn fetch(&self) -> Result<Vec<DirectoryMember>> {
        match tokio::time::timeout(self.fetch_timeout, self.lister.list_members()).await {
            Ok(Ok(listing)) => {
                info!(
                    "Retrieved {} members from {}",
                    listing.len(),
                    self.lister.directory_name()
                );
                Ok(listing)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::timeout(format!(
                "{} member listing exceeded {:?}",
                self.lister.directory_name(),
                self.fetch_timeout
            ))),
        }
    }

    /// Map and bulk-write a listing
    async fn apply(&self, listing: &[DirectoryMember]) -> Result<usize> {
        let records = to_member_records(listing);
        self.store.upsert_members(&records).await?;
        debug!("Wrote {} members to the store", records.len());
        Ok(records.len())
    }

    /// Base delay plus a random share of the jitter bound
    fn next_delay(&mut self) -> Duration {
        let jitter_ms = if self.retry_jitter_ms > 0 {
            self.rng.gen_range(0..=self.retry_jitter_ms)
        } else {
            0
        };
        self.retry_base_delay + Duration::from_millis(jitter_ms)
    }

    fn cancelled(&self, attempts: usize) -> ReconcileOutcome {
        info!(
            "Reconciliation cancelled after {} attempt(s)",
            attempts
        );
        self.emit_event(SyncEvent::Cancelled { attempts });
        ReconcileOutcome::Cancelled { attempts }
    }

    /// Emit a sync event
    ///
    /// Never blocks. A full channel drops the event with a warning; a
    /// dropped receiver means nobody is listening and is not an error.
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    "Sync event channel full, dropping {:?}. Consider increasing event_channel_capacity.",
                    event
                );
            }
            Err(TrySendError::Closed(_)) => {
                debug!("No sync event subscriber");
            }
        }
    }
}
