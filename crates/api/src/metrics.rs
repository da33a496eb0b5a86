//! Prometheus metrics recorder and render handle.
//!
//! Metric names are defined once in [`hark_core::metric_names`] and recorded
//! at their call sites; this module only owns the global recorder.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus metrics recorder (global).
///
/// Returns the [`PrometheusHandle`] used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    tracing::info!("Prometheus metrics recorder installed");
    handle
}
