//! HTTP request handlers

use std::sync::Arc;

use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::engine::{Dispatcher, Engine, Stats};
use crate::error::Error;
use crate::queue::WorkQueue;
use crate::store::ResultStore;

/// Shared application state
pub struct AppState {
    pub dispatcher: Dispatcher,
    queue: Arc<WorkQueue>,
    store: Arc<ResultStore>,
    workers: usize,
}

impl AppState {
    pub fn new(engine: &Engine) -> Self {
        Self {
            dispatcher: engine.dispatcher(),
            queue: Arc::clone(engine.queue()),
            store: Arc::clone(engine.store()),
            workers: engine.stats().workers,
        }
    }

    fn stats(&self) -> Stats {
        Stats::collect(self.workers, &self.queue, &self.store)
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.stats())
}

/// Queue the request for a worker and wait for its result.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(body) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    state.dispatcher.handle(body).await.map(Json)
}

/// Run the model inline without going through the worker pool.
pub async fn predict_sync(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(body) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    state.dispatcher.predict_direct(body).await.map(Json)
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            Error::QueueFull { .. } | Error::QueueClosed => StatusCode::SERVICE_UNAVAILABLE,
            Error::Inference(_) | Error::Config(_) | Error::Io(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            Error::Inference(message) => message,
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
