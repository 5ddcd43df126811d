//! Fixed-size pool of long-lived workers sharing one queue.
//!
//! Pool size is the hard upper bound on requests actually being served;
//! any number of dispatchers may be waiting on top of that.

use crate::predictor::Predictor;
use crate::queue::WorkQueue;
use crate::store::ResultStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{info, warn};

use super::worker::Worker;

pub struct WorkerPool {
    queue: Arc<WorkQueue>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers onto the current tokio runtime.
    pub fn spawn(
        size: usize,
        queue: Arc<WorkQueue>,
        store: Arc<ResultStore>,
        predictor: Arc<dyn Predictor>,
        result_ttl: Option<Duration>,
    ) -> Self {
        let handles = (0..size)
            .map(|id| {
                let worker = Worker::new(
                    id,
                    Arc::clone(&queue),
                    Arc::clone(&store),
                    Arc::clone(&predictor),
                    result_ttl,
                );
                tokio::spawn(worker.run())
            })
            .collect();

        info!(workers = size, model = predictor.name(), "worker pool started");
        Self { queue, handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Close the queue, let workers drain it, and wait for them to exit.
    ///
    /// Workers still busy after `grace` are aborted.
    pub async fn shutdown(self, grace: Duration) {
        self.queue.close();

        let joins = self.handles.into_iter().enumerate().map(|(id, handle)| async move {
            let abort = handle.abort_handle();
            match timeout(grace, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(worker = id, "worker task ended abnormally: {e}"),
                Err(_) => {
                    warn!(worker = id, "worker did not stop in time, aborting");
                    abort.abort();
                }
            }
        });
        futures::future::join_all(joins).await;

        info!("worker pool stopped");
    }
}
