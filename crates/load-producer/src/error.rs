//! Producer Error Types

use dataset::DatasetError;
use thiserror::Error;

/// Errors that end a producer
#[derive(Debug, Error)]
pub enum ProducerError {
    /// Batch could not be drawn from the dataset
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Failed to encode alert batch: {0}")]
    Encode(#[from] serde_json::Error),

    /// Target unreachable; the run is no longer valid
    #[error("Delivery to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Invalid target URL
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("Invalid target {target:?}: {source}")]
    Invalid {
        target: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported scheme for target {0:?}")]
    UnsupportedScheme(String),
}
