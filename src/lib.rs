//! # mulepool
//!
//! Offloads inference requests from an HTTP front-end to a fixed pool of
//! long-lived workers and correlates each result back to its caller.
//!
//! Provides a work queue, a result store keyed by correlation id, the worker
//! pool, the dispatcher that ties them together, and the axum front-end.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod predictor;
pub mod queue;
pub mod server;
pub mod store;
pub mod telemetry;
