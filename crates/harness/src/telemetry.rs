//! Logging and Metrics Setup

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use load_producer::ALERTS_FIRED_METRIC;
use receiver::NOTIFICATIONS_RECEIVED_METRIC;

/// Initialize logging; `RUST_LOG` overrides the INFO default
pub fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Install the global Prometheus recorder and describe the harness counters
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    metrics::describe_counter!(
        ALERTS_FIRED_METRIC,
        "Number of alerts fired against Alertmanager instances"
    );
    metrics::describe_counter!(
        NOTIFICATIONS_RECEIVED_METRIC,
        "Number of notifications received from Alertmanager."
    );
}
