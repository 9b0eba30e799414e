//! Registers every phase's metrics and detects naming conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::api::ApiMetrics>(&mut all_metrics);
    register_phase_metrics::<super::orphans::OrphanMetrics>(&mut all_metrics);

    info!(
        "Registered {} total metrics across all phases",
        all_metrics.len()
    );
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, MetricDoc>) {
    T::register_metrics();
    let phase_name = T::phase_name();

    for doc in T::metrics_documentation() {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' registered again by phase '{}'",
                doc.name, phase_name
            );
            continue;
        }
        debug!(
            "  - {} ({:?}, labels {:?}): {}",
            doc.name, doc.metric_type, doc.labels, doc.help
        );
        all_metrics.insert(doc.name, doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ApiMetrics, OrphanMetrics};

    /// Phase segment of a metric name, e.g. "api" in "courseware_api_requests_total"
    fn phase_of(metric_name: &str) -> &str {
        metric_name
            .strip_prefix("courseware_")
            .and_then(|rest| rest.split('_').next())
            .unwrap_or("unknown")
    }

    #[test]
    fn test_phase_of() {
        assert_eq!(phase_of("courseware_api_requests_total"), "api");
        assert_eq!(phase_of("courseware_orphans_found_total"), "orphans");
        assert_eq!(phase_of("http_requests_total"), "unknown");
    }

    #[test]
    fn test_documented_names_belong_to_their_phase() {
        for doc in ApiMetrics::metrics_documentation() {
            assert_eq!(phase_of(doc.name), ApiMetrics::phase_name());
        }
        for doc in OrphanMetrics::metrics_documentation() {
            assert_eq!(phase_of(doc.name), OrphanMetrics::phase_name());
        }
    }
}
