//! Client-side polling cache of the full record set.
//!
//! The cache is refreshed on a fixed interval (see [`Subscription`]) and
//! right after every mutation issued through it. Every consumer observes
//! the same [`CacheSnapshot`] through a `watch` channel.

mod subscription;

pub use subscription::Subscription;

use crate::errors::AppResult;
use crate::models::mold_change::{MoldChange, MoldChangePatch, NewMoldChange};
use crate::store::{Claim, RecordStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Nothing fetched yet.
    Loading,
    Ready,
    /// Last refresh failed; `records` still holds the previous good set.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    pub records: Vec<MoldChange>,
    pub state: LoadState,
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Bumped on every completed refresh, successful or not.
    pub generation: u64,
}

impl CacheSnapshot {
    fn loading() -> Self {
        Self {
            records: Vec::new(),
            state: LoadState::Loading,
            refreshed_at: None,
            generation: 0,
        }
    }

    /// First pending / in-progress record in store order.
    pub fn active(&self) -> Option<&MoldChange> {
        self.records.iter().find(|r| r.is_active())
    }

    pub fn is_ready(&self) -> bool {
        self.state == LoadState::Ready
    }
}

pub struct PollingCache {
    store: Arc<dyn RecordStore>,
    tx: watch::Sender<CacheSnapshot>,
    /// Refresh tickets handed out so far.
    issued: AtomicU64,
    /// Highest ticket already satisfied by a completed fetch.
    gate: Mutex<u64>,
}

impl PollingCache {
    pub fn new(store: Arc<dyn RecordStore>) -> Arc<Self> {
        let (tx, _rx) = watch::channel(CacheSnapshot::loading());
        Arc::new(Self {
            store,
            tx,
            issued: AtomicU64::new(0),
            gate: Mutex::new(0),
        })
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        self.tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<CacheSnapshot> {
        self.tx.subscribe()
    }

    /// Start periodic refreshes. The first one runs immediately.
    pub fn subscribe(self: &Arc<Self>, period: Duration) -> Subscription {
        Subscription::start(Arc::clone(self), period)
    }

    /// Fetch the record set and publish it.
    ///
    /// Overlapping calls never run two fetches at once: a caller waits for
    /// the fetch in flight and skips its own if that fetch started after
    /// the caller asked.
    pub async fn refresh(&self) {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let mut covered = self.gate.lock().await;
        if *covered >= ticket {
            tracing::trace!(ticket, "refresh already covered");
            return;
        }
        let cover = self.issued.load(Ordering::SeqCst);

        match self.store.list().await {
            Ok(records) => {
                tracing::debug!(count = records.len(), "cache refreshed");
                self.tx.send_modify(|snap| {
                    snap.records = records;
                    snap.state = LoadState::Ready;
                    snap.refreshed_at = Some(Utc::now());
                    snap.generation += 1;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "cache refresh failed");
                self.tx.send_modify(|snap| {
                    snap.state = LoadState::Failed(e.to_string());
                    snap.generation += 1;
                });
            }
        }

        *covered = cover;
    }

    // ---------------------------------------------------------------------
    // Mutations: store call, then a forced refresh before returning.
    // ---------------------------------------------------------------------

    pub async fn create(&self, change: NewMoldChange) -> AppResult<MoldChange> {
        let result = self.store.create(change).await;
        self.refresh().await;
        result
    }

    pub async fn claim(&self, change: NewMoldChange) -> AppResult<Claim> {
        let result = self.store.claim(change).await;
        self.refresh().await;
        result
    }

    pub async fn update(&self, id: &str, patch: MoldChangePatch) -> AppResult<MoldChange> {
        let result = self.store.update(id, patch).await;
        self.refresh().await;
        result
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = self.store.delete(id).await;
        self.refresh().await;
        result
    }

    /// Close a record: completed, ended now, with the given downtime.
    pub async fn complete(&self, id: &str, downtime_minutes: u32) -> AppResult<MoldChange> {
        self.update(id, MoldChangePatch::completion(Utc::now(), downtime_minutes))
            .await
    }
}
