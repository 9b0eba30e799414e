//! HTTP API metrics: request counts by area and status, and latencies.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct ApiMetrics;

impl ApiMetrics {
    /// Record a finished request. `area` is the top-level API (courses, enrollment, ...).
    pub fn record_request(area: &'static str, status: u16, duration_secs: f64) {
        ::metrics::counter!(
            phase_metric!(counter, "api", "requests"),
            "area" => area,
            "status" => status.to_string()
        )
        .increment(1);
        ::metrics::histogram!(
            phase_metric!(histogram, "api", "request_duration_seconds"),
            "area" => area
        )
        .record(duration_secs);
    }

    pub fn record_throttled(area: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "api", "throttled"), "area" => area)
            .increment(1);
    }
}

impl PhaseMetrics for ApiMetrics {
    fn register_metrics() {
        use metrics::{describe_counter, describe_histogram};

        describe_counter!(
            phase_metric!(counter, "api", "requests"),
            "Total number of API requests served"
        );
        describe_counter!(
            phase_metric!(counter, "api", "throttled"),
            "Total number of API requests rejected by the throttle"
        );
        describe_histogram!(
            phase_metric!(histogram, "api", "request_duration_seconds"),
            "Duration of API requests in seconds"
        );
    }

    fn phase_name() -> &'static str {
        "api"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "api", "requests"),
                metric_type: MetricType::Counter,
                help: "Total number of API requests served",
                labels: vec!["area", "status"],
            },
            MetricDoc {
                name: phase_metric!(counter, "api", "throttled"),
                metric_type: MetricType::Counter,
                help: "Total number of API requests rejected by the throttle",
                labels: vec!["area"],
            },
            MetricDoc {
                name: phase_metric!(histogram, "api", "request_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Duration of API requests in seconds",
                labels: vec!["area"],
            },
        ]
    }
}
