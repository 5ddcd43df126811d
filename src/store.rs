//! Result store keyed by correlation id.
//!
//! Workers `put` finished outcomes; the dispatcher that minted the id waits
//! on its own key and consumes the entry exactly once. Keys are independent:
//! the only shared lock is the map itself, held for a few instructions.
//!
//! Lifecycle of a key:
//!
//! ```text
//! reserve ──> put ──> take            (normal path)
//! reserve ──> abandon ──> put (dropped) ──> reap
//! put ──> (never consumed) ──> expires_at ──> reap
//! ```

use crate::model::{CorrelationId, Outcome, ResultEntry};
use crate::telemetry::metrics;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::debug;

/// How long an abandonment marker lingers waiting for a late result.
pub const DEFAULT_TOMBSTONE_TTL: Duration = Duration::from_secs(300);

struct Slot {
    entry: Option<ResultEntry>,
    ready: Arc<Notify>,
    /// A dispatcher currently holds a [`Pending`] for this key.
    reserved: bool,
    /// The dispatcher gave up; a late result is discarded on arrival.
    abandoned_at: Option<Instant>,
}

impl Slot {
    fn empty() -> Self {
        Self {
            entry: None,
            ready: Arc::new(Notify::new()),
            reserved: false,
            abandoned_at: None,
        }
    }
}

pub struct ResultStore {
    slots: Mutex<HashMap<CorrelationId, Slot>>,
    tombstone_ttl: Duration,
}

impl ResultStore {
    pub fn new(tombstone_ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            tombstone_ttl,
        }
    }

    /// Publish an outcome and wake whoever waits on `id`.
    ///
    /// Returns `false` if the key was abandoned and the outcome dropped.
    pub fn put(&self, id: CorrelationId, outcome: Outcome, ttl: Option<Duration>) -> bool {
        let ready = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id).or_insert_with(Slot::empty);

            if slot.abandoned_at.is_some() {
                slots.remove(&id);
                drop(slots);
                debug!(%id, "late result for abandoned request discarded");
                metrics::results_reclaimed().add(1, &[]);
                return false;
            }

            slot.entry = Some(ResultEntry {
                id,
                outcome,
                completed_at: Utc::now(),
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            });
            Arc::clone(&slot.ready)
        };

        // notify_one leaves a permit if the waiter hasn't parked yet.
        ready.notify_one();
        true
    }

    pub fn exists(&self, id: CorrelationId) -> bool {
        self.slots
            .lock()
            .get(&id)
            .is_some_and(|slot| slot.entry.is_some())
    }

    pub fn get(&self, id: CorrelationId) -> Option<ResultEntry> {
        self.slots.lock().get(&id).and_then(|slot| slot.entry.clone())
    }

    /// Remove everything held for `id`. Returns whether an entry was present.
    pub fn delete(&self, id: CorrelationId) -> bool {
        self.slots
            .lock()
            .remove(&id)
            .is_some_and(|slot| slot.entry.is_some())
    }

    /// Get and delete in one step.
    pub fn take(&self, id: CorrelationId) -> Option<ResultEntry> {
        let mut slots = self.slots.lock();
        let entry = slots.get_mut(&id)?.entry.take()?;
        slots.remove(&id);
        Some(entry)
    }

    /// Register interest in `id` before its work item is queued.
    ///
    /// Dropping the returned handle without consuming the result abandons the
    /// key, so a timed-out or disconnected caller never leaks an entry.
    pub fn reserve(self: &Arc<Self>, id: CorrelationId) -> Pending {
        let ready = {
            let mut slots = self.slots.lock();
            let slot = slots.entry(id).or_insert_with(Slot::empty);
            slot.reserved = true;
            slot.abandoned_at = None;
            Arc::clone(&slot.ready)
        };

        Pending {
            store: Arc::clone(self),
            id,
            ready,
            consumed: false,
        }
    }

    /// Give up on `id`. A present entry is dropped now, a future one on arrival.
    pub fn abandon(&self, id: CorrelationId) {
        let mut slots = self.slots.lock();
        let slot = slots.entry(id).or_insert_with(Slot::empty);

        if slot.entry.is_some() {
            slots.remove(&id);
            drop(slots);
            debug!(%id, "abandoned result removed");
            metrics::results_reclaimed().add(1, &[]);
        } else {
            slot.reserved = false;
            slot.abandoned_at = Some(Instant::now());
            debug!(%id, "request abandoned before its result arrived");
        }
    }

    /// Drop expired entries and stale abandonment markers. Returns how many.
    ///
    /// Entries a dispatcher is actively waiting for are left alone.
    pub fn reap(&self, now: Instant) -> usize {
        let mut slots = self.slots.lock();
        let before = slots.len();
        let tombstone_ttl = self.tombstone_ttl;

        slots.retain(|_, slot| {
            if slot.reserved {
                return true;
            }
            if let Some(at) = slot.abandoned_at {
                return now.saturating_duration_since(at) < tombstone_ttl;
            }
            match slot.entry.as_ref().and_then(|entry| entry.expires_at) {
                Some(expires_at) => expires_at > now,
                None => slot.entry.is_some(),
            }
        });

        before - slots.len()
    }

    /// Number of published results not yet consumed.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.entry.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of dispatchers currently waiting.
    pub fn waiting(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.reserved && slot.entry.is_none())
            .count()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOMBSTONE_TTL)
    }
}

/// A dispatcher's claim on one correlation id.
pub struct Pending {
    store: Arc<ResultStore>,
    id: CorrelationId,
    ready: Arc<Notify>,
    consumed: bool,
}

impl Pending {
    pub fn id(&self) -> CorrelationId {
        self.id
    }

    /// Wait until the result for this id is published, then consume it.
    ///
    /// Never spins: parks on the key's notifier between checks. Wrap in
    /// `tokio::time::timeout` to bound the wait.
    pub async fn wait(&mut self) -> ResultEntry {
        loop {
            if let Some(entry) = self.store.take(self.id) {
                self.consumed = true;
                return entry;
            }
            self.ready.notified().await;
        }
    }

    /// Forget the key entirely, for when its work item never got queued.
    pub fn release(&mut self) {
        self.store.delete(self.id);
        self.consumed = true;
    }
}

impl Drop for Pending {
    fn drop(&mut self) {
        if !self.consumed {
            self.store.abandon(self.id);
        }
    }
}
