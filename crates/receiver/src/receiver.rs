//! Receiver Implementation

use alert_model::{alert_hashes, combine_hashes, Alert, ReceivedNotification};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::log::NotificationLog;

/// Counter of notifications, labeled by group key, origin and fingerprint
pub const NOTIFICATIONS_RECEIVED_METRIC: &str = "notifications_received_total";

/// Webhook body sent by the alert-routing cluster.
///
/// Only the fields needed for correlation are decoded.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(rename = "groupKey", default)]
    pub group_key: String,
    #[serde(rename = "externalURL", default)]
    pub external_url: String,
    #[serde(default)]
    pub alerts: Vec<Alert>,
}

/// Records inbound notifications for correlation against fired batches
#[derive(Default)]
pub struct NotificationReceiver {
    log: NotificationLog,
}

impl NotificationReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode and record a raw webhook body.
    ///
    /// Malformed bodies are logged and dropped; the caller acknowledges the
    /// request either way.
    pub fn ingest(&self, body: &[u8]) -> Option<ReceivedNotification> {
        match serde_json::from_slice::<WebhookPayload>(body) {
            Ok(payload) => Some(self.record(payload)),
            Err(e) => {
                warn!("Could not decode notification payload: {}", e);
                None
            }
        }
    }

    /// Fingerprint a decoded payload and append it to the log
    pub fn record(&self, payload: WebhookPayload) -> ReceivedNotification {
        let hashes = alert_hashes(&payload.alerts);
        let hash = combine_hashes(&hashes);

        metrics::counter!(
            NOTIFICATIONS_RECEIVED_METRIC,
            "group_key" => payload.group_key.clone(),
            "origin" => payload.external_url.clone(),
            "hash" => format!("{:x}", hash)
        )
        .increment(1);

        let notification = self.log.append_with(|timestamp| ReceivedNotification {
            timestamp,
            origin: payload.external_url,
            group_key: payload.group_key,
            notification_hash: hash,
            alert_hashes: hashes,
        });
        debug!(
            "Notification from {} ({} alerts, {:x})",
            notification.origin,
            notification.alert_hashes.len(),
            hash
        );
        notification
    }

    /// Everything received since the last reset
    pub fn events(&self) -> Vec<ReceivedNotification> {
        self.log.snapshot()
    }

    /// Empty the log in one step, returning everything it held.
    ///
    /// A notification lands either in the returned list or in the log that
    /// remains, never in neither.
    pub fn reset(&self) -> Vec<ReceivedNotification> {
        let drained = self.log.reset();
        debug!("Receiver reset, took {} notifications", drained.len());
        drained
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
