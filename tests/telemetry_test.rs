//! Integration tests for telemetry initialization and span helpers.

use mulepool::model::CorrelationId;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// In-memory writer for an fmt subscriber.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn telemetry_initializes_without_endpoint() {
    // A global subscriber can only be set once per process, so a second
    // init elsewhere may return Err; both outcomes are acceptable here.
    let config = mulepool::telemetry::TelemetryConfig {
        endpoint: None,
        service_name: "mulepool-test".to_string(),
        log_level: "debug".to_string(),
    };
    if let Ok(guard) = mulepool::telemetry::init_telemetry(config) {
        assert!(!guard.is_exporting());
        guard.force_flush();
    }
}

#[test]
fn state_transitions_are_emitted_inside_the_work_span() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .finish();

    let id = CorrelationId::new();
    tracing::subscriber::with_default(subscriber, || {
        let span = mulepool::telemetry::work::start_work_span(3, &id);
        mulepool::telemetry::work::record_state_transition(&span, "queued", "running");
        mulepool::telemetry::work::record_state_transition(&span, "running", "completed");
    });

    let output = captured.contents();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2, "unexpected output: {output}");
    for line in &lines {
        assert!(line.contains("work.execute"), "missing span: {line}");
        assert!(line.contains(&id.to_string()), "missing work id: {line}");
        assert!(line.contains("state_transition"), "missing event: {line}");
    }
    assert!(lines[0].contains("queued") && lines[0].contains("running"));
    assert!(lines[1].contains("completed"));
}

#[test]
fn metric_instruments_work_without_a_provider() {
    use mulepool::telemetry::metrics;
    metrics::requests_dispatched().add(1, &[]);
    metrics::results_reaped().add(2, &[]);
    metrics::item_duration_ms().record(1.5, &[]);
}
