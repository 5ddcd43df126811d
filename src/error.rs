//! Error types for mulepool.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no result for {id} within {after:?}")]
    Timeout { id: String, after: Duration },

    #[error("work queue is full ({capacity} items)")]
    QueueFull { capacity: usize },

    #[error("work queue is closed")]
    QueueClosed,

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
