//! Dispatch engine: queue, result store, worker pool and reaper wired
//! together. This is the composition root; nothing here is global.

pub mod dispatch;
pub mod pool;
pub mod reaper;
pub mod worker;

pub use dispatch::Dispatcher;
pub use pool::WorkerPool;
pub use worker::Worker;

use crate::config::Config;
use crate::predictor::Predictor;
use crate::queue::WorkQueue;
use crate::store::{DEFAULT_TOMBSTONE_TTL, ResultStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Point-in-time counters for the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub workers: usize,
    pub queue_depth: usize,
    pub pending_results: usize,
    pub waiting_requests: usize,
}

impl Stats {
    pub fn collect(workers: usize, queue: &WorkQueue, store: &ResultStore) -> Self {
        Self {
            workers,
            queue_depth: queue.len(),
            pending_results: store.len(),
            waiting_requests: store.waiting(),
        }
    }
}

/// A running engine. Must be started inside a tokio runtime.
pub struct Engine {
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
    dispatcher: Dispatcher,
    pool: WorkerPool,
    reaper: JoinHandle<()>,
    shutdown: CancellationToken,
}

impl Engine {
    pub fn start(config: &Config, predictor: Arc<dyn Predictor>) -> Self {
        let queue = Arc::new(WorkQueue::new(config.queue_capacity));
        let store = Arc::new(ResultStore::new(
            config.result_ttl.unwrap_or(DEFAULT_TOMBSTONE_TTL),
        ));
        let shutdown = CancellationToken::new();

        let pool = WorkerPool::spawn(
            config.workers,
            Arc::clone(&queue),
            Arc::clone(&store),
            Arc::clone(&predictor),
            config.result_ttl,
        );
        let reaper = reaper::spawn_reaper(
            Arc::clone(&store),
            config.reaper_interval,
            shutdown.clone(),
        );
        let dispatcher = Dispatcher::new(
            Arc::clone(&queue),
            Arc::clone(&store),
            predictor,
            config.request_timeout,
        );

        Self {
            queue,
            store,
            dispatcher,
            pool,
            reaper,
            shutdown,
        }
    }

    pub fn dispatcher(&self) -> Dispatcher {
        self.dispatcher.clone()
    }

    pub fn queue(&self) -> &Arc<WorkQueue> {
        &self.queue
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    pub fn stats(&self) -> Stats {
        Stats::collect(self.pool.size(), &self.queue, &self.store)
    }

    /// Stop accepting work, drain the queue, stop workers and the reaper.
    pub async fn shutdown(self, grace: Duration) {
        self.pool.shutdown(grace).await;
        self.shutdown.cancel();
        if let Err(e) = self.reaper.await {
            warn!("reaper task ended abnormally: {e}");
        }
    }
}
