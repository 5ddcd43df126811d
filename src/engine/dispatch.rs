//! Front-end side of the protocol: hand a request to the pool and wait for
//! exactly its own result.

use crate::error::{Error, Result};
use crate::model::{CorrelationId, Outcome, WorkItem};
use crate::predictor::Predictor;
use crate::queue::WorkQueue;
use crate::store::ResultStore;
use crate::telemetry::metrics;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::worker::execute;

/// Cheap to clone; one instance is shared by every request handler.
#[derive(Clone)]
pub struct Dispatcher {
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
    predictor: Arc<dyn Predictor>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<WorkQueue>,
        store: Arc<ResultStore>,
        predictor: Arc<dyn Predictor>,
        timeout: Duration,
    ) -> Self {
        Self {
            queue,
            store,
            predictor,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Queue `body` for a worker and return `{"res": ...}` once it's done.
    ///
    /// Malformed bodies are rejected before anything is queued. If the wait
    /// ends early (timeout, or the caller's future is dropped) the id is
    /// abandoned and a late result is reclaimed by the store.
    pub async fn handle(&self, body: Value) -> Result<Value> {
        validate(&body)?;

        let id = CorrelationId::new();
        let mut pending = self.store.reserve(id);

        if let Err(e) = self.queue.push(WorkItem::new(id, body)) {
            pending.release();
            return Err(e);
        }
        metrics::requests_dispatched().add(1, &[]);
        debug!(%id, "request dispatched");

        let entry = match timeout(self.timeout, pending.wait()).await {
            Ok(entry) => entry,
            Err(_) => {
                warn!(%id, timeout_ms = self.timeout.as_millis() as u64, "request timed out");
                metrics::request_timeouts().add(1, &[]);
                return Err(Error::Timeout {
                    id: id.to_string(),
                    after: self.timeout,
                });
            }
        };

        match entry.outcome {
            Outcome::Success(_) => Ok(entry.outcome.to_body()),
            Outcome::Failure(error) => Err(Error::Inference(error)),
        }
    }

    /// Run the predictor inline, bypassing the queue.
    ///
    /// Returns `{"input": body, "prediction": ...}`.
    pub async fn predict_direct(&self, body: Value) -> Result<Value> {
        validate(&body)?;

        let outcome = timeout(self.timeout, execute(Arc::clone(&self.predictor), body.clone()))
            .await
            .map_err(|_| Error::Timeout {
                id: "direct".to_string(),
                after: self.timeout,
            })?;

        match outcome {
            Outcome::Success(prediction) => Ok(json!({
                "input": body,
                "prediction": prediction,
            })),
            Outcome::Failure(error) => Err(Error::Inference(error)),
        }
    }
}

/// A request must be a JSON object carrying a string `text`.
pub fn validate(body: &Value) -> Result<()> {
    let Some(object) = body.as_object() else {
        return Err(Error::BadRequest(
            "request body must be a JSON object".to_string(),
        ));
    };

    match object.get("text") {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(Error::BadRequest("field `text` must be a string".to_string())),
        None => Err(Error::BadRequest("missing field `text`".to_string())),
    }
}
