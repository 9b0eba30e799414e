//! Metrics infrastructure for the courseware service
//!
//! Each area of the service defines its own metrics in a dedicated submodule.
//! Names are built with [`phase_metric!`] so they all follow
//! `courseware_{phase}_{metric_name}[_total]`.

pub mod api;
pub mod orphans;
pub mod registry;

pub use api::ApiMetrics;
pub use orphans::OrphanMetrics;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder and register every phase's metrics.
///
/// Idempotent. Returns the handle used to render `/metrics`, or `None` when
/// another recorder was already installed in this process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus recorder installed");
                registry::register_all_metrics();
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        })
        .clone()
}

/// Render the current snapshot in Prometheus text format
pub fn render() -> String {
    init_metrics().map(|h| h.render()).unwrap_or_default()
}

/// Trait for phase-specific metrics collections
pub trait PhaseMetrics {
    /// Describe all metrics of this phase to the recorder
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
    pub labels: Vec<&'static str>,
}

#[derive(Debug, Clone)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Build a metric name following `courseware_{phase}_{metric_name}_{type}`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("courseware_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("courseware_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
