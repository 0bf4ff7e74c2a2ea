//! Report Events
//!
//! Two event kinds end up in a report: batches fired at a target and
//! notifications received back from the cluster. Both render to one line.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::hash::alert_hashes;
use crate::labels::Alert;

/// UTC timestamp format used in reports (fixed nine fractional digits)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// One successful delivery of a batch to one target
#[derive(Debug, Clone, PartialEq)]
pub struct FiredEvent {
    /// Target URL the batch was posted to
    pub target: String,
    /// Alerts contained in the batch
    pub alerts: Vec<Alert>,
    /// Delivery completion time
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for FiredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ALERTS {} {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.target
        )?;
        for h in alert_hashes(&self.alerts) {
            write!(f, " {:x}", h)?;
        }
        Ok(())
    }
}

/// One inbound webhook call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedNotification {
    pub timestamp: DateTime<Utc>,
    /// `externalURL` of the sending cluster member
    pub origin: String,
    pub group_key: String,
    /// XOR of `alert_hashes`
    pub notification_hash: u64,
    pub alert_hashes: Vec<u64>,
}

impl fmt::Display for ReceivedNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NOTIFICATION {} {} {} {:x}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.origin,
            self.group_key,
            self.notification_hash
        )?;
        for h in &self.alert_hashes {
            write!(f, " {:x}", h)?;
        }
        Ok(())
    }
}

/// Event written to a report
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Fired(FiredEvent),
    Received(ReceivedNotification),
}

impl Event {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Event::Fired(e) => e.timestamp,
            Event::Received(n) => n.timestamp,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Fired(e) => fmt::Display::fmt(e, f),
            Event::Received(n) => fmt::Display::fmt(n, f),
        }
    }
}

impl From<FiredEvent> for Event {
    fn from(e: FiredEvent) -> Self {
        Event::Fired(e)
    }
}

impl From<ReceivedNotification> for Event {
    fn from(n: ReceivedNotification) -> Self {
        Event::Received(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_alert;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap() + chrono::Duration::nanoseconds(42)
    }

    #[test]
    fn test_render_fired() {
        let alerts = vec![
            Alert::new([("alertname", "A")].into_iter().collect()),
            Alert::new([("alertname", "B")].into_iter().collect()),
        ];
        let expected = format!(
            "ALERTS 2024-03-09T14:05:07.000000042Z http://am-0:9093/api/v1/alerts {:x} {:x}",
            hash_alert(&alerts[0]),
            hash_alert(&alerts[1])
        );
        let event = Event::Fired(FiredEvent {
            target: "http://am-0:9093/api/v1/alerts".to_string(),
            alerts,
            timestamp: ts(),
        });
        assert_eq!(event.to_string(), expected);
    }

    #[test]
    fn test_render_fired_empty_batch() {
        let event = FiredEvent {
            target: "t".to_string(),
            alerts: vec![],
            timestamp: ts(),
        };
        assert_eq!(event.to_string(), "ALERTS 2024-03-09T14:05:07.000000042Z t");
    }

    #[test]
    fn test_render_notification() {
        let event = Event::Received(ReceivedNotification {
            timestamp: ts(),
            origin: "http://am-1:9093".to_string(),
            group_key: "{}:{alertname=\"A\"}".to_string(),
            notification_hash: 0xab ^ 0x0f,
            alert_hashes: vec![0xab, 0x0f],
        });
        assert_eq!(
            event.to_string(),
            "NOTIFICATION 2024-03-09T14:05:07.000000042Z http://am-1:9093 {}:{alertname=\"A\"} a4 ab f"
        );
    }

    #[test]
    fn test_timestamp_dispatch() {
        let n = ReceivedNotification {
            timestamp: ts(),
            origin: String::new(),
            group_key: String::new(),
            notification_hash: 0,
            alert_hashes: vec![],
        };
        assert_eq!(Event::from(n).timestamp(), ts());
    }
}
