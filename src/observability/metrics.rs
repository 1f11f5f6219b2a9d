//! Metrics collection and exposition.
//!
//! # Metrics
//! - `lights_http_requests_total` (counter): requests by method, endpoint, status class
//! - `lights_http_request_duration_seconds` (histogram): latency by method, endpoint
//! - `lights_http_active_connections` (gauge): requests currently in flight
//! - `lights_operations_total` (counter): fan-out operations by result
//!
//! # Design Decisions
//! - Handlers and middleware talk to a [`MetricsSink`] they were given
//! - [`PrometheusSink`] forwards to the `metrics` facade
//! - [`RecordingSink`] keeps observations in memory for assertions

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Destination for request and operation observations.
pub trait MetricsSink: Send + Sync + 'static {
    /// Current number of requests in flight.
    fn set_in_flight(&self, in_flight: usize);

    /// One finished request.
    fn observe_request(&self, method: &str, route: &str, status_class: &str, elapsed: Duration);

    /// One finished fan-out operation.
    fn observe_operation(&self, operation: &str, succeeded: bool);
}

/// Collapse a status code into its class label (`"2xx"`, `"5xx"`, ...).
pub fn status_class(status: u16) -> &'static str {
    match status {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

/// Start the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Sink backed by the `metrics` crate recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn set_in_flight(&self, in_flight: usize) {
        metrics::gauge!("lights_http_active_connections").set(in_flight as f64);
    }

    fn observe_request(&self, method: &str, route: &str, status_class: &str, elapsed: Duration) {
        metrics::counter!(
            "lights_http_requests_total",
            "method" => method.to_string(),
            "endpoint" => route.to_string(),
            "status" => status_class.to_string()
        )
        .increment(1);
        metrics::histogram!(
            "lights_http_request_duration_seconds",
            "method" => method.to_string(),
            "endpoint" => route.to_string()
        )
        .record(elapsed.as_secs_f64());
    }

    fn observe_operation(&self, operation: &str, succeeded: bool) {
        let result = if succeeded { "success" } else { "error" };
        metrics::counter!(
            "lights_operations_total",
            "operation" => operation.to_string(),
            "result" => result
        )
        .increment(1);
    }
}

/// A finished request as seen by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub route: String,
    pub status_class: String,
}

#[derive(Debug, Default)]
struct Recorded {
    requests: Vec<RecordedRequest>,
    operations: Vec<(String, bool)>,
    in_flight: Vec<usize>,
}

/// In-memory sink that keeps every observation.
#[derive(Debug, Default)]
pub struct RecordingSink {
    inner: Mutex<Recorded>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn operations(&self) -> Vec<(String, bool)> {
        self.lock().operations.clone()
    }

    /// Every in-flight value reported, in order.
    pub fn in_flight_history(&self) -> Vec<usize> {
        self.lock().in_flight.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MetricsSink for RecordingSink {
    fn set_in_flight(&self, in_flight: usize) {
        self.lock().in_flight.push(in_flight);
    }

    fn observe_request(&self, method: &str, route: &str, status_class: &str, _elapsed: Duration) {
        self.lock().requests.push(RecordedRequest {
            method: method.to_string(),
            route: route.to_string(),
            status_class: status_class.to_string(),
        });
    }

    fn observe_operation(&self, operation: &str, succeeded: bool) {
        self.lock().operations.push((operation.to_string(), succeeded));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(302), "3xx");
        assert_eq!(status_class(400), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(42), "other");
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.set_in_flight(1);
        sink.set_in_flight(0);
        sink.observe_operation("turn_on", true);
        sink.observe_request("POST", "/lights/on", "2xx", Duration::from_millis(3));

        assert_eq!(sink.in_flight_history(), vec![1, 0]);
        assert_eq!(sink.operations(), vec![("turn_on".to_string(), true)]);
        assert_eq!(sink.requests()[0].route, "/lights/on");
    }

    #[test]
    fn test_prometheus_sink_without_recorder_is_noop() {
        let sink = PrometheusSink;
        sink.set_in_flight(3);
        sink.observe_request("GET", "/health", "2xx", Duration::from_millis(1));
        sink.observe_operation("turn_off", false);
    }
}
