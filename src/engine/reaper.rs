//! Periodic sweep of expired results and stale abandonment markers.

use crate::store::ResultStore;
use crate::telemetry::metrics;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Floor for the sweep period; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub fn spawn_reaper(
    store: Arc<ResultStore>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    let period = if interval.is_zero() {
        warn!(min = ?MIN_INTERVAL, "reaper interval is zero, using the minimum");
        MIN_INTERVAL
    } else {
        interval
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("reaper shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    let reaped = store.reap(Instant::now());
                    if reaped > 0 {
                        debug!(reaped, "expired results reaped");
                        metrics::results_reaped().add(reaped as u64, &[]);
                    }
                }
            }
        }
    })
}
