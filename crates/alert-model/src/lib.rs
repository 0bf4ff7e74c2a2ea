//! Alert Model
//!
//! Shared vocabulary for the load harness:
//! - Label sets and the alert wire type
//! - Order-independent alert identity hashing
//! - Fired / received events and their report rendering

mod event;
mod hash;
mod labels;

pub use event::{Event, FiredEvent, ReceivedNotification, TIMESTAMP_FORMAT};
pub use hash::{alert_hashes, combine_hashes, fingerprint, hash_alert};
pub use labels::{Alert, LabelSet, METRIC_NAME_LABEL};
