//! Orphan maintenance metrics

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct OrphanMetrics;

impl OrphanMetrics {
    pub fn record_scan(found: usize) {
        ::metrics::counter!(phase_metric!(counter, "orphans", "scans")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "orphans", "found")).increment(found as u64);
    }

    pub fn record_deleted(blocks: usize) {
        ::metrics::counter!(phase_metric!(counter, "orphans", "blocks_deleted"))
            .increment(blocks as u64);
    }
}

impl PhaseMetrics for OrphanMetrics {
    fn register_metrics() {
        use metrics::describe_counter;

        describe_counter!(
            phase_metric!(counter, "orphans", "scans"),
            "Total number of orphan scans run against a course"
        );
        describe_counter!(
            phase_metric!(counter, "orphans", "found"),
            "Total number of orphans found by scans"
        );
        describe_counter!(
            phase_metric!(counter, "orphans", "blocks_deleted"),
            "Total number of blocks removed while deleting orphans"
        );
    }

    fn phase_name() -> &'static str {
        "orphans"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "orphans", "scans"),
                metric_type: MetricType::Counter,
                help: "Total number of orphan scans run against a course",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "orphans", "found"),
                metric_type: MetricType::Counter,
                help: "Total number of orphans found by scans",
                labels: vec![],
            },
            MetricDoc {
                name: phase_metric!(counter, "orphans", "blocks_deleted"),
                metric_type: MetricType::Counter,
                help: "Total number of blocks removed while deleting orphans",
                labels: vec![],
            },
        ]
    }
}
