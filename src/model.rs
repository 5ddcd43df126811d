//! Core data model.
//!
//! A work item is one inference request travelling from a dispatcher to a
//! worker. A result entry is what the worker hands back. The correlation id
//! is the only thing joining the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Instant;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Correlation Id
// ---------------------------------------------------------------------------

/// Newtype for correlation ids. Random 128-bit, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Work Item
// ---------------------------------------------------------------------------

/// A unit of work placed on the queue for a worker to execute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: CorrelationId,

    /// The request body as received. The queue doesn't interpret it.
    pub payload: Value,

    pub enqueued_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(id: CorrelationId, payload: Value) -> Self {
        Self {
            id,
            payload,
            enqueued_at: Utc::now(),
        }
    }
}

/// The part of a payload a worker understands. Extra fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    pub text: String,
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of executing one work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success(Value),
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Response body shape: `{"res": ...}` or `{"error": ...}`.
    pub fn to_body(&self) -> Value {
        match self {
            Outcome::Success(value) => json!({ "res": value }),
            Outcome::Failure(error) => json!({ "error": error }),
        }
    }
}

// ---------------------------------------------------------------------------
// Result Entry
// ---------------------------------------------------------------------------

/// A completed result staged for single retrieval.
#[derive(Debug, Clone)]
pub struct ResultEntry {
    pub id: CorrelationId,
    pub outcome: Outcome,
    pub completed_at: DateTime<Utc>,
    /// When the reaper may drop this entry. `None` = never.
    pub expires_at: Option<Instant>,
}
