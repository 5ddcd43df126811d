//! Route definitions

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use super::handlers::{AppState, health, predict, predict_sync, stats};

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/predict", post(predict))
        .route("/predict/sync", post(predict_sync))
}
