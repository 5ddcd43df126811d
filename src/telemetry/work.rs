//! Spans for work items moving through a worker.

use crate::model::CorrelationId;
use tracing::Span;

/// Start a span covering one work item on one worker.
///
/// The `work.state` field is declared empty and updated via
/// [`record_state_transition`].
pub fn start_work_span(worker: usize, id: &CorrelationId) -> Span {
    tracing::info_span!(
        "work.execute",
        "work.worker" = worker,
        "work.id" = %id,
        "work.state" = tracing::field::Empty,
    )
}

/// Record a state transition on `span` and emit it as an event.
pub fn record_state_transition(span: &Span, from: &str, to: &str) {
    span.record("work.state", to);
    span.in_scope(|| {
        tracing::debug!(from = from, to = to, "state_transition");
    });
}
