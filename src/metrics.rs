use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const RUNS_TOTAL: &str = "hotness_runs_total";
pub const ITEMS_TOTAL: &str = "hotness_items_total";
pub const WINDOWS_TOTAL: &str = "hotness_windows_total";
pub const DEGENERATE_WINDOWS_TOTAL: &str = "hotness_degenerate_windows_total";
pub const PROVIDER_ERRORS_TOTAL: &str = "hotness_provider_errors_total";
pub const RUN_DURATION_MS: &str = "hotness_run_duration_ms";

/// One-time metrics registration (so series show up on /metrics).
///
/// Called by [`prometheus_handle`] after the recorder is installed.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RUNS_TOTAL, "Completed scoring runs.");
        describe_counter!(ITEMS_TOTAL, "Items scored across all runs.");
        describe_counter!(WINDOWS_TOTAL, "Day windows scored for density.");
        describe_counter!(
            DEGENERATE_WINDOWS_TOTAL,
            "Windows where some items had no cross-source neighbour."
        );
        describe_counter!(
            PROVIDER_ERRORS_TOTAL,
            "Embedding provider failures (fatal to the run)."
        );
        describe_histogram!(RUN_DURATION_MS, "Scoring run duration in milliseconds.");
    });
}

/// Process-wide Prometheus handle.
///
/// Installs the recorder on first use. If another recorder is already
/// installed (tests, embedding apps), falls back to a detached handle that
/// renders an empty exposition instead of panicking.
pub fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();
    HANDLE
        .get_or_init(|| {
            let handle = match PrometheusBuilder::new().install_recorder() {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(error = %e, "prometheus recorder not installed; using detached handle");
                    PrometheusBuilder::new().build_recorder().handle()
                }
            };
            // Descriptions only stick once a recorder is in place.
            ensure_described();
            handle
        })
        .clone()
}
