//! Alert Load Producer
//!
//! Fires rotating windows of dataset alerts at every configured target on a
//! fixed interval and records each delivery for later correlation.

mod batcher;
mod error;
mod producer;
mod target;

pub use batcher::AlertBatcher;
pub use error::{ProducerError, TargetError};
pub use producer::{LoadProducer, ProducerConfig, ALERTS_FIRED_METRIC};
pub use target::{normalize_target, parse_targets, DEFAULT_ALERTS_PATH};
