//! Harness Error Types

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use dataset::DatasetError;
use load_producer::{ProducerError, TargetError};

/// Errors that abort a harness run
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Target(#[from] TargetError),

    /// Dataset missing, unreadable or too short for the planned windows
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// A producer lost its target; results of the run are invalid
    #[error(transparent)]
    Producer(#[from] ProducerError),

    #[error("Report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Producer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Server error: {0}")]
    Server(#[source] std::io::Error),
}
