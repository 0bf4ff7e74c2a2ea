//! Alertmanager Load Harness
//!
//! Fires synthetic alert batches at an Alertmanager cluster, records the
//! notifications the cluster sends back, and writes one merged timeline per
//! test case for correlation.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod server;
pub mod telemetry;

pub use config::{Cli, ConfigError, LoadTestConfigs, TestCaseConfig, DEFAULT_DRAIN_PERIOD};
pub use error::HarnessError;
pub use orchestrator::{CaseState, Orchestrator, REPORT_FILE};
pub use server::create_router;
pub use telemetry::{init_logging, install_metrics};

use load_producer::parse_targets;
use receiver::NotificationReceiver;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Run the harness until every load test is done, a fatal error occurs, or
/// the process is asked to stop.
///
/// With `--noload` only the receiver and metrics endpoints are served.
pub async fn run(cli: Cli) -> Result<(), HarnessError> {
    let targets = parse_targets(&cli.alertmanagers)?;
    let configs = if cli.noload {
        LoadTestConfigs::default()
    } else {
        LoadTestConfigs::load(&cli.config)?
    };

    let metrics = install_metrics()?;
    let receiver = Arc::new(NotificationReceiver::new());
    let listener = server::bind(cli.listen).await?;
    let mut server = tokio::spawn(server::serve(
        listener,
        create_router(receiver.clone(), metrics),
    ));

    let (done_tx, done_rx) = oneshot::channel();
    let (load, _serve_only) = if cli.noload {
        info!("Load generation disabled, serving notifications only");
        (None, Some(done_tx))
    } else {
        if targets.is_empty() {
            warn!("No alertmanagers configured; batches will be drawn but not delivered");
        }
        let orchestrator = Orchestrator::new(configs.load_tests, targets, receiver)
            .with_results_dir(&cli.results_dir)
            .with_drain_period(cli.drain);
        (Some(tokio::spawn(orchestrator.run(done_tx))), None)
    };

    tokio::select! {
        _ = server::shutdown_signal() => {}
        done = done_rx => {
            // A dropped signal means the orchestrator failed; surface its error
            if let Some(load) = load {
                let reports = load.await??;
                for report in reports {
                    info!("Report written: {}", report.display());
                }
            }
            if done.is_ok() {
                info!("Load testing complete");
            }
        }
        served = &mut server => {
            served??;
            warn!("Server stopped");
        }
    }

    Ok(())
}
