//! Metrics collection and Prometheus export.
//!
//! HTTP request metrics come from `service_core::middleware::metrics_middleware`;
//! this module adds the proxy-specific series and owns the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics recorder.
///
/// Called once from `main`; later calls are ignored.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::error!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// One outbound provider call. `outcome` is `ok` or a `ProviderError::kind`.
pub fn record_provider_call(provider: &'static str, outcome: &'static str, elapsed: Duration) {
    counter!(
        "wellness_provider_requests_total",
        "provider" => provider,
        "outcome" => outcome
    )
    .increment(1);
    histogram!("wellness_provider_latency_seconds", "provider" => provider)
        .record(elapsed.as_secs_f64());
}

/// A proxy route answered with its canned payload.
pub fn record_fallback(route: &'static str) {
    counter!("wellness_fallback_responses_total", "route" => route).increment(1);
}

pub fn record_tokens(input_tokens: i32, output_tokens: i32) {
    counter!("wellness_tokens_total", "direction" => "input").increment(input_tokens.max(0) as u64);
    counter!("wellness_tokens_total", "direction" => "output")
        .increment(output_tokens.max(0) as u64);
}

pub fn record_migrated(count: usize) {
    counter!("wellness_migrated_records_total").increment(count as u64);
}
