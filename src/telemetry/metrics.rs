//! Metric instrument factories.
//!
//! Instruments come from the `"mulepool"` meter of the globally registered
//! `MeterProvider`; with none installed they are no-ops.

use opentelemetry::metrics::{Counter, Histogram, Meter};

fn meter() -> Meter {
    opentelemetry::global::meter("mulepool")
}

/// Counter: requests handed to the queue.
pub fn requests_dispatched() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.requests.dispatched")
        .with_description("Requests placed on the work queue")
        .build()
}

/// Counter: requests whose result did not arrive in time.
pub fn request_timeouts() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.requests.timeouts")
        .with_description("Requests that gave up waiting for a result")
        .build()
}

/// Counter: queue operations.
/// Labels: `operation` ("push" | "push_rejected" | "pop").
pub fn queue_operations() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.queue.operations")
        .with_description("Number of work queue operations")
        .build()
}

/// Counter: results published by workers.
/// Labels: `outcome` ("ok" | "error").
pub fn results_published() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.results.published")
        .with_description("Results published to the result store")
        .build()
}

/// Counter: results dropped because their requester had gone away.
pub fn results_reclaimed() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.results.reclaimed")
        .with_description("Results of abandoned requests that were discarded")
        .build()
}

/// Counter: entries removed by the periodic reaper.
pub fn results_reaped() -> Counter<u64> {
    meter()
        .u64_counter("mulepool.results.reaped")
        .with_description("Expired entries removed by the reaper")
        .build()
}

/// Histogram: time a worker spent on one item.
/// Labels: `outcome`.
pub fn item_duration_ms() -> Histogram<f64> {
    meter()
        .f64_histogram("mulepool.work.duration_ms")
        .with_description("Work item execution time in milliseconds")
        .with_unit("ms")
        .build()
}
