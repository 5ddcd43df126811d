//! A single worker: pop one item, run the predictor, publish the outcome.

use crate::model::{Outcome, PredictRequest, WorkItem};
use crate::predictor::Predictor;
use crate::queue::WorkQueue;
use crate::store::ResultStore;
use crate::telemetry::metrics;
use crate::telemetry::work::{record_state_transition, start_work_span};
use opentelemetry::KeyValue;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, debug, info, warn};

pub struct Worker {
    pub id: usize,
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
    predictor: Arc<dyn Predictor>,
    result_ttl: Option<Duration>,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Arc<WorkQueue>,
        store: Arc<ResultStore>,
        predictor: Arc<dyn Predictor>,
        result_ttl: Option<Duration>,
    ) -> Self {
        Self {
            id,
            queue,
            store,
            predictor,
            result_ttl,
        }
    }

    /// Serve items until the queue is closed and drained.
    pub async fn run(self) {
        info!(worker = self.id, model = self.predictor.name(), "worker started");

        while let Some(item) = self.queue.pop().await {
            self.process(item).await;
        }

        info!(worker = self.id, "worker stopped");
    }

    /// Execute one item and publish its outcome under the item's id.
    pub async fn process(&self, item: WorkItem) {
        let WorkItem {
            id,
            payload,
            enqueued_at,
        } = item;
        let span = start_work_span(self.id, &id);

        async {
            record_state_transition(&span, "queued", "running");
            let waited_ms = (chrono::Utc::now() - enqueued_at).num_milliseconds();
            let start = Instant::now();

            let outcome = execute(Arc::clone(&self.predictor), payload).await;

            let duration_ms = start.elapsed().as_millis() as u64;
            let status = if outcome.is_success() { "ok" } else { "error" };
            match &outcome {
                Outcome::Success(_) => {
                    record_state_transition(&span, "running", "completed");
                    info!(%id, waited_ms, duration_ms, "work item completed");
                }
                Outcome::Failure(error) => {
                    record_state_transition(&span, "running", "failed");
                    warn!(%id, waited_ms, duration_ms, %error, "work item failed");
                }
            }

            metrics::item_duration_ms()
                .record(duration_ms as f64, &[KeyValue::new("outcome", status)]);
            metrics::results_published().add(1, &[KeyValue::new("outcome", status)]);

            if !self.store.put(id, outcome, self.result_ttl) {
                debug!(%id, "nobody is waiting for this result any more");
            }
        }
        .instrument(span.clone())
        .await
    }
}

/// Run the predictor against a raw payload.
///
/// Every failure, including a malformed payload or a panicking predictor,
/// comes back as [`Outcome::Failure`] so the caller always gets an answer.
pub async fn execute(predictor: Arc<dyn Predictor>, payload: Value) -> Outcome {
    let request: PredictRequest = match serde_json::from_value(payload) {
        Ok(request) => request,
        Err(e) => return Outcome::Failure(format!("bad payload: {e}")),
    };

    match tokio::task::spawn_blocking(move || predictor.predict(&request.text)).await {
        Ok(Ok(value)) => Outcome::Success(value),
        Ok(Err(e)) => Outcome::Failure(e.to_string()),
        Err(e) if e.is_panic() => Outcome::Failure(format!(
            "predictor panicked: {}",
            panic_message(&*e.into_panic())
        )),
        Err(e) => Outcome::Failure(format!("predictor task failed: {e}")),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
