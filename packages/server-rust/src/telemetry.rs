//! Logging and metrics bootstrap.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Resolves the log filter: `RUST_LOG` first, then `level`, then
/// [`DEFAULT_LOG_FILTER`].
///
/// # Errors
///
/// Returns an error if `level` is not a valid filter directive.
pub fn build_env_filter(level: Option<&str>) -> anyhow::Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    Ok(EnvFilter::try_new(level.unwrap_or(DEFAULT_LOG_FILTER))?)
}

/// Installs the global `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_tracing(level: Option<&str>, format: LogFormat) -> anyhow::Result<()> {
    let filter = build_env_filter(level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    }
    .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Installs the Prometheus recorder and serves `/metrics` on `addr`.
///
/// Without a recorder the `metrics` macros are no-ops.
///
/// # Errors
///
/// Returns an error if the recorder is already installed or the listener
/// cannot be started.
pub fn install_metrics_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
