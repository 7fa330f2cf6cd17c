//! Service metrics for the portal itself
//!
//! Prometheus exposition of how the relays behave: upstream latency,
//! upstream failures, served requests, stub fallbacks. Exposed at
//! `GET /metrics` by the server crate.

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::sync::OnceLock;

/// Latency buckets for upstream round-trips (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PortalMetricsInner> = OnceLock::new();

struct PortalMetricsInner {
    upstream_request_seconds: HistogramVec,
    upstream_errors: IntCounterVec,
    requests: IntCounterVec,
    stub_responses: IntCounter,
}

impl PortalMetricsInner {
    fn new() -> Self {
        Self {
            upstream_request_seconds: register_histogram_vec!(
                "portal_upstream_request_seconds",
                "Round-trip time of upstream API calls",
                &["upstream"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register upstream_request_seconds"),

            upstream_errors: register_int_counter_vec!(
                "portal_upstream_errors_total",
                "Upstream calls that ended in a transport, status, or parse error",
                &["upstream"]
            )
            .expect("Failed to register upstream_errors_total"),

            requests: register_int_counter_vec!(
                "portal_requests_total",
                "Requests served, by endpoint",
                &["endpoint"]
            )
            .expect("Failed to register requests_total"),

            stub_responses: register_int_counter!(
                "portal_stub_responses_total",
                "Metrics responses served from the synthetic development snapshot"
            )
            .expect("Failed to register stub_responses_total"),
        }
    }
}

/// Lightweight handle to the global metrics instance; clones share the
/// same underlying registry.
#[derive(Clone, Default)]
pub struct PortalMetrics {
    _private: (),
}

impl PortalMetrics {
    /// Create a handle, initializing the global registry on first call.
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PortalMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PortalMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record one upstream round-trip
    pub fn observe_upstream(&self, upstream: &str, duration_secs: f64) {
        self.inner()
            .upstream_request_seconds
            .with_label_values(&[upstream])
            .observe(duration_secs);
    }

    /// Record one failed upstream call
    pub fn inc_upstream_error(&self, upstream: &str) {
        self.inner()
            .upstream_errors
            .with_label_values(&[upstream])
            .inc();
    }

    /// Record one served request
    pub fn inc_request(&self, endpoint: &str) {
        self.inner().requests.with_label_values(&[endpoint]).inc();
    }

    /// Record one response served from the development stub
    pub fn inc_stub_response(&self) {
        self.inner().stub_responses.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Encoder;

    #[test]
    fn metrics_register_and_expose() {
        let metrics = PortalMetrics::new();
        metrics.observe_upstream("argocd", 0.05);
        metrics.inc_upstream_error("prometheus");
        metrics.inc_request("cluster_metrics");
        metrics.inc_stub_response();

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("portal_upstream_request_seconds_bucket"));
        assert!(text.contains("portal_upstream_errors_total"));
        assert!(text.contains("portal_requests_total"));
        assert!(text.contains("portal_stub_responses_total"));
    }

    #[test]
    fn handles_share_one_registry() {
        let a = PortalMetrics::new();
        let b = a.clone();
        a.inc_request("argocd_applications");
        b.inc_request("argocd_applications");
        // No panic from double registration is the point here.
        let _ = PortalMetrics::new();
    }
}
