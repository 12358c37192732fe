//! Prometheus metrics for notegate

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::Result;
use crate::error::Error;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
static START_TIME: OnceLock<Instant> = OnceLock::new();

// Server metrics
const METRIC_UPTIME: &str = "notegate_uptime_seconds";
const METRIC_INFO: &str = "notegate_info";

// Token metrics
const METRIC_TOKENS_ISSUED: &str = "notegate_tokens_issued_total";
const METRIC_TOKEN_REJECTIONS: &str = "notegate_token_rejections_total";
const METRIC_ROTATIONS: &str = "notegate_refresh_rotations_total";

/// Initialize Prometheus metrics recorder.
pub fn init_metrics() -> Result<()> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Config(format!("Failed to install metrics recorder: {e}")))?;

    PROMETHEUS_HANDLE.set(handle).ok();
    START_TIME.set(Instant::now()).ok();

    register_metrics();
    tracing::info!("Prometheus metrics initialized");
    Ok(())
}

fn register_metrics() {
    describe_gauge!(METRIC_UPTIME, "Server uptime in seconds");
    describe_gauge!(METRIC_INFO, "Server information (always 1)");

    describe_counter!(METRIC_TOKENS_ISSUED, "Total tokens signed, by kind");
    describe_counter!(
        METRIC_TOKEN_REJECTIONS,
        "Total presented tokens rejected, by reason"
    );
    describe_counter!(METRIC_ROTATIONS, "Total refresh tokens exchanged for a new pair");

    gauge!(
        METRIC_INFO,
        "version" => env!("CARGO_PKG_VERSION"),
    )
    .set(1.0);
}

/// Render metrics in Prometheus text format.
#[must_use]
pub fn render_metrics() -> String {
    if let Some(start) = START_TIME.get() {
        gauge!(METRIC_UPTIME).set(start.elapsed().as_secs_f64());
    }

    PROMETHEUS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

/// Record a signed token (`access` or `refresh`).
pub fn record_token_issued(kind: &'static str) {
    counter!(METRIC_TOKENS_ISSUED, "kind" => kind).increment(1);
}

/// Record a rejected token, labelled with the error kind.
pub fn record_token_rejection(reason: &'static str) {
    counter!(METRIC_TOKEN_REJECTIONS, "reason" => reason).increment(1);
}

/// Record a successful refresh rotation.
pub fn record_rotation() {
    counter!(METRIC_ROTATIONS).increment(1);
}
