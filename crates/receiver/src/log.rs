//! Notification Log

use alert_model::ReceivedNotification;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only list of received notifications.
///
/// Entries are fully built before they are pushed under the lock, so a
/// snapshot never contains a partial notification.
#[derive(Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<ReceivedNotification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    // Appends are whole values; a panic elsewhere cannot leave one torn.
    fn entries(&self) -> MutexGuard<'_, Vec<ReceivedNotification>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    fn append(&self, notification: ReceivedNotification) {
        self.entries().push(notification);
    }

    /// Stamp and append a notification while holding the lock, keeping the
    /// log in timestamp order across concurrent writers
    pub fn append_with(
        &self,
        build: impl FnOnce(DateTime<Utc>) -> ReceivedNotification,
    ) -> ReceivedNotification {
        let mut entries = self.entries();
        let notification = build(Utc::now());
        entries.push(notification.clone());
        notification
    }

    /// Copy of everything recorded so far, in arrival order
    pub fn snapshot(&self) -> Vec<ReceivedNotification> {
        self.entries().clone()
    }

    /// Empty the log, returning what it held
    pub fn reset(&self) -> Vec<ReceivedNotification> {
        std::mem::take(&mut *self.entries())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn notification(i: u64) -> ReceivedNotification {
        ReceivedNotification {
            timestamp: Utc::now(),
            origin: "am".to_string(),
            group_key: format!("g{i}"),
            notification_hash: i,
            alert_hashes: vec![i],
        }
    }

    #[test]
    fn test_append_snapshot_reset() {
        let log = NotificationLog::new();
        log.append(notification(1));
        log.append(notification(2));

        let snap = log.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[1].group_key, "g2");

        let drained = log.reset();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
        assert!(log.snapshot().is_empty());
    }

    #[test]
    fn test_concurrent_appends() {
        let log = Arc::new(NotificationLog::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        log.append(notification(t * 1000 + i));
                        let snap = log.snapshot();
                        assert!(snap.iter().all(|n| n.alert_hashes == vec![n.notification_hash]));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(log.len(), 800);
    }

    #[test]
    fn test_append_with_keeps_timestamp_order() {
        let log = Arc::new(NotificationLog::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.append_with(|timestamp| ReceivedNotification {
                            timestamp,
                            ..notification(t * 100 + i)
                        });
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let snap = log.snapshot();
        assert!(snap.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
