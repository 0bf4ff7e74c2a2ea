//! Alert Identity Hashing
//!
//! An alert hashes to XXH64 over its labels sorted by name, each pair
//! written as `name 0xFF value 0xFF`. A set of alerts is fingerprinted by
//! XOR-ing the member hashes, so the result ignores ordering. Pairs of
//! identical alerts cancel out; comparisons downstream rely on this.

use xxhash_rust::xxh64::xxh64;

use crate::labels::{Alert, LabelSet};

/// Byte that cannot occur inside UTF-8 label text
const SEP: u8 = 0xff;

fn hash_labels(labels: &LabelSet) -> u64 {
    let mut buf = Vec::with_capacity(256);
    for (name, value) in labels.iter() {
        buf.extend_from_slice(name.as_bytes());
        buf.push(SEP);
        buf.extend_from_slice(value.as_bytes());
        buf.push(SEP);
    }
    xxh64(&buf, 0)
}

/// Hash of a single alert, independent of label insertion order
pub fn hash_alert(alert: &Alert) -> u64 {
    hash_labels(&alert.labels)
}

/// Per-alert hashes, in alert order
pub fn alert_hashes(alerts: &[Alert]) -> Vec<u64> {
    alerts.iter().map(hash_alert).collect()
}

/// XOR-combine already computed alert hashes into one fingerprint
pub fn combine_hashes(hashes: &[u64]) -> u64 {
    hashes.iter().fold(0, |acc, h| acc ^ h)
}

/// Order-independent fingerprint of an alert set
pub fn fingerprint(alerts: &[Alert]) -> u64 {
    alerts.iter().fold(0, |acc, a| acc ^ hash_alert(a))
}
