//! HTTP Endpoints
//!
//! Notification webhook, Prometheus scrape endpoint and a health probe.

use axum::{extract::State, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tokio::signal;
use tracing::{info, warn};

use receiver::NotificationReceiver;

use crate::error::HarnessError;

/// Create the application router
pub fn create_router(receiver: Arc<NotificationReceiver>, metrics: PrometheusHandle) -> Router {
    let scrape = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics);

    receiver::router(receiver)
        .merge(scrape)
        .route("/-/healthy", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http())
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// Bind the listener up front so address errors surface before any case runs
pub async fn bind(addr: SocketAddr) -> Result<tokio::net::TcpListener, HarnessError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(HarnessError::Server)?;
    info!("Listening on {}", addr);
    Ok(listener)
}

/// Serve until the process exits
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> Result<(), HarnessError> {
    axum::serve(listener, app).await.map_err(HarnessError::Server)
}

/// Resolves on ctrl-c or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
