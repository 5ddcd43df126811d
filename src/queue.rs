//! Work queue shared by dispatchers (producers) and workers (consumers).
//!
//! Push wakes one waiting worker. Which worker gets which item is not
//! defined; a woken worker that finds the queue empty simply waits again.

use crate::error::{Error, Result};
use crate::model::WorkItem;
use crate::telemetry::metrics;
use opentelemetry::KeyValue;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tracing::trace;

pub struct WorkQueue {
    items: Mutex<VecDeque<WorkItem>>,
    ready: Notify,
    closed: AtomicBool,
    /// Maximum queued items, 0 = unbounded.
    capacity: usize,
}

impl WorkQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            ready: Notify::new(),
            closed: AtomicBool::new(false),
            capacity,
        }
    }

    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Enqueue an item and wake one worker.
    pub fn push(&self, item: WorkItem) -> Result<()> {
        if self.is_closed() {
            record("push_rejected");
            return Err(Error::QueueClosed);
        }

        {
            let mut items = self.items.lock();
            if self.capacity > 0 && items.len() >= self.capacity {
                drop(items);
                record("push_rejected");
                return Err(Error::QueueFull {
                    capacity: self.capacity,
                });
            }
            trace!(id = %item.id, depth = items.len() + 1, "work item queued");
            items.push_back(item);
        }

        self.ready.notify_one();
        record("push");
        Ok(())
    }

    /// Take the next item without waiting.
    pub fn try_pop(&self) -> Option<WorkItem> {
        let item = self.items.lock().pop_front();
        if item.is_some() {
            record("pop");
        }
        item
    }

    /// Wait for the next item.
    ///
    /// Returns `None` only once the queue is closed and drained.
    pub async fn pop(&self) -> Option<WorkItem> {
        loop {
            // Register before checking so a push or close landing in between
            // still wakes us.
            let notified = self.ready.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(item) = self.try_pop() {
                return Some(item);
            }
            if self.is_closed() {
                return None;
            }

            notified.await;
        }
    }

    /// Refuse further pushes and wake every waiting worker.
    ///
    /// Items already queued can still be popped.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.ready.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

fn record(operation: &'static str) {
    metrics::queue_operations().add(1, &[KeyValue::new("operation", operation)]);
}
