//! Prometheus error metrics.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `faultline_errors_total` | Counter | `key`, `status` | Emitted errors by true key |
//!
//! Recording goes through the `metrics` facade, so [`MetricsObserver`] works
//! with any installed recorder. [`init_metrics`] installs the Prometheus one
//! and [`render_metrics`] renders it in text format for a scrape endpoint.

use crate::error::TelemetryError;
use crate::TelemetryResult;
use faultline_core::ErrorObserver;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Counter incremented once per emitted error.
pub const ERRORS_TOTAL: &str = "faultline_errors_total";

/// Global metrics handle for rendering.
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetricsConfig {
    /// Whether to install the Prometheus recorder.
    pub enabled: bool,
}

/// Installs the global Prometheus recorder.
///
/// Calling this again after a successful install is a no-op.
///
/// # Errors
///
/// Returns `TelemetryError::MetricsInit` if another recorder is already
/// installed.
pub fn init_metrics(config: &MetricsConfig) -> TelemetryResult<()> {
    if !config.enabled || METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;

    let _ = METRICS_HANDLE.set(handle);
    register_metric_descriptions();

    Ok(())
}

/// Returns the global metrics handle if initialized.
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Renders metrics in Prometheus format.
///
/// Returns `None` if metrics are not initialized.
#[must_use]
pub fn render_metrics() -> Option<String> {
    METRICS_HANDLE.get().map(PrometheusHandle::render)
}

fn register_metric_descriptions() {
    describe_counter!(ERRORS_TOTAL, "Total number of error responses by error key and status");
}

/// Records one emitted error.
pub fn record_error(key: &str, status: u16) {
    counter!(
        ERRORS_TOTAL,
        "key" => key.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// [`ErrorObserver`] that feeds [`ERRORS_TOTAL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl ErrorObserver for MetricsObserver {
    fn observe(&self, key: &str, code: u16) {
        record_error(key, code);
    }
}
