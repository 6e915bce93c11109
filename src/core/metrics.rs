use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!("batch_runs_total", "Batch grading runs started");
    metrics::describe_counter!("batch_items_total", "Batch items processed, by outcome");
    metrics::describe_counter!("reviews_saved_total", "Single-item reviews saved");
    metrics::describe_histogram!(
        "ai_scoring_duration_seconds",
        metrics::Unit::Seconds,
        "Latency of successful AI scoring calls"
    );
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
