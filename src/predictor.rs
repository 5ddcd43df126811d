//! The model collaborator.
//!
//! A predictor is loaded once at startup and shared by every worker. Its
//! internals are opaque to the pool: text in, JSON out. Calls happen on the
//! blocking thread pool, so implementations may be CPU-heavy and synchronous.

use serde_json::Value;
use thiserror::Error;

/// Failure reported by a predictor for one input.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct PredictError(pub String);

impl PredictError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait Predictor: Send + Sync + 'static {
    /// Short name used in logs and spans.
    fn name(&self) -> &str;

    fn predict(&self, text: &str) -> Result<Value, PredictError>;
}

/// Stand-in model that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoPredictor;

impl Predictor for EchoPredictor {
    fn name(&self) -> &str {
        "echo"
    }

    fn predict(&self, text: &str) -> Result<Value, PredictError> {
        Ok(Value::String(text.to_string()))
    }
}
