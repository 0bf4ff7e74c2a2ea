//! Notification Receiver
//!
//! Accepts webhook notifications from the alert-routing cluster, fingerprints
//! the alerts they carry, and keeps them for the end-of-case report.

mod handler;
mod log;
mod receiver;

pub use handler::{router, NOTIFY_PATH};
pub use log::NotificationLog;
pub use receiver::{NotificationReceiver, WebhookPayload, NOTIFICATIONS_RECEIVED_METRIC};
